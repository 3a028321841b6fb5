use {chrono::Utc, sqlx::SqlitePool, tracing::debug};

use crate::error::Result;

/// How long an identity pair stays resolvable (60 days).
pub const DEFAULT_TTL_SECS: i64 = 60 * 60 * 24 * 60;

/// Key into the identity cache.
///
/// Two entries are written per relayed message, one per platform, both
/// scoped to the Telegram chat of the bridge, so a later reply on either
/// side can resolve its paired id from its own platform's perspective:
///
/// - `dc:{tgchat}/{dc_msg_id}` → Telegram message id
/// - `tg:{tgchat}/{tg_msg_id}` → Delta Chat message id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a Delta Chat message id, resolving to its Telegram twin.
    #[must_use]
    pub fn deltachat(tgchat: i64, dc_msg_id: i64) -> Self {
        Self(format!("dc:{tgchat}/{dc_msg_id}"))
    }

    /// Key for a Telegram message id, resolving to its Delta Chat twin.
    #[must_use]
    pub fn telegram(tgchat: i64, tg_msg_id: i64) -> Self {
        Self(format!("tg:{tgchat}/{tg_msg_id}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// SQLite-backed cross-platform message-identity cache.
///
/// Best-effort: entries expire after [`DEFAULT_TTL_SECS`] and a miss only
/// costs reply threading, never delivery.
pub struct IdentityCache {
    pool: SqlitePool,
    ttl_secs: i64,
}

impl IdentityCache {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    #[must_use]
    pub fn with_ttl(pool: SqlitePool, ttl_secs: i64) -> Self {
        Self { pool, ttl_secs }
    }

    /// Initialize the identity-cache table schema.
    pub async fn init(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS idcache (
                key        TEXT    PRIMARY KEY,
                value      INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a message-id pairing. An existing entry for the key is
    /// replaced and its expiry reset.
    pub async fn put(&self, key: &CacheKey, value: i64) -> Result<()> {
        let expires_at = Utc::now().timestamp() + self.ttl_secs;
        sqlx::query("INSERT OR REPLACE INTO idcache (key, value, expires_at) VALUES (?, ?, ?)")
            .bind(key.as_str())
            .bind(value)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Resolve a pairing, if present and not expired.
    pub async fn get(&self, key: &CacheKey) -> Result<Option<i64>> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT value FROM idcache WHERE key = ? AND expires_at > ?")
                .bind(key.as_str())
                .bind(Utc::now().timestamp())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|r| r.0))
    }

    /// Delete expired entries. Called opportunistically at session start.
    pub async fn purge_expired(&self) -> Result<u64> {
        let purged = sqlx::query("DELETE FROM idcache WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?
            .rows_affected();
        if purged > 0 {
            debug!(purged, "expired identity-cache entries purged");
        }
        Ok(purged)
    }
}
