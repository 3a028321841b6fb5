//! Persistence for the bridge: the link table pairing Delta Chat groups with
//! Telegram chats, and the message-identity cache used to thread replies
//! across the two platforms.

pub mod cache;
pub mod error;
pub mod link;

pub use {
    cache::{CacheKey, IdentityCache},
    error::{Error, Result},
    link::LinkStore,
};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

/// Open (creating if missing) the sqlite database at `path` and initialize
/// the schema.
pub async fn open_database(path: &std::path::Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Create the link and identity-cache tables if they do not exist.
///
/// Also usable against an in-memory database in tests.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    LinkStore::init(pool).await?;
    IdentityCache::init(pool).await?;
    Ok(())
}
