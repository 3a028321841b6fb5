use {
    sqlx::SqlitePool,
    tokio::sync::Mutex,
    tracing::debug,
};

use crate::error::{Error, Result};

/// SQLite-backed link table pairing Delta Chat groups with Telegram chats.
///
/// `dcchat` is unique: a Delta Chat group bridges to at most one Telegram
/// chat. `tgchat` is not: several Delta Chat groups may fan into the same
/// Telegram chat, and the Telegram→Delta Chat path delivers to all of them.
///
/// All mutations run inside a transaction under a store-level mutex, so
/// concurrent bridge/unbridge/auto-unbridge operations from the two
/// execution contexts never interleave their read-modify-write sequences.
/// The lock is never held across a network call.
pub struct LinkStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl LinkStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    /// Initialize the link table schema.
    pub async fn init(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS link (
                dcchat INTEGER PRIMARY KEY,
                tgchat INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_link_tgchat ON link (tgchat)")
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Create a new link.
    ///
    /// Fails with [`Error::AlreadyBridged`] when `dcchat` already has one.
    pub async fn add_link(&self, dcchat: i64, tgchat: i64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let existing: Option<(i64,)> = sqlx::query_as("SELECT tgchat FROM link WHERE dcchat = ?")
            .bind(dcchat)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(Error::AlreadyBridged { dcchat });
        }

        sqlx::query("INSERT INTO link (dcchat, tgchat) VALUES (?, ?)")
            .bind(dcchat)
            .bind(tgchat)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(dcchat, tgchat, "link added");
        Ok(())
    }

    /// Remove the link owned by `dcchat`.
    ///
    /// Fails with [`Error::NotBridged`] when none exists.
    pub async fn remove_link(&self, dcchat: i64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM link WHERE dcchat = ?")
            .bind(dcchat)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if removed == 0 {
            return Err(Error::NotBridged { dcchat });
        }
        tx.commit().await?;

        debug!(dcchat, "link removed");
        Ok(())
    }

    /// Remove every link whose Telegram side is `tgchat`, returning the
    /// Delta Chat groups that were unbridged.
    ///
    /// Used by the delivery worker when a Telegram destination turns out to
    /// be permanently unreachable. An empty result is not an error.
    pub async fn remove_links_by_tgchat(&self, tgchat: i64) -> Result<Vec<i64>> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let rows: Vec<(i64,)> = sqlx::query_as("SELECT dcchat FROM link WHERE tgchat = ?")
            .bind(tgchat)
            .fetch_all(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM link WHERE tgchat = ?")
            .bind(tgchat)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        let dcchats: Vec<i64> = rows.into_iter().map(|r| r.0).collect();
        if !dcchats.is_empty() {
            debug!(tgchat, count = dcchats.len(), "links removed by telegram chat");
        }
        Ok(dcchats)
    }

    /// Telegram chat linked to `dcchat`, if any.
    pub async fn find_by_dcchat(&self, dcchat: i64) -> Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT tgchat FROM link WHERE dcchat = ?")
            .bind(dcchat)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.0))
    }

    /// All Delta Chat groups linked to `tgchat` (fan-out).
    pub async fn find_all_by_tgchat(&self, tgchat: i64) -> Result<Vec<i64>> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT dcchat FROM link WHERE tgchat = ? ORDER BY dcchat")
                .bind(tgchat)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}
