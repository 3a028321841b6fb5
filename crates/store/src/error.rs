/// Crate-wide result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed store errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The Delta Chat group already has a link.
    #[error("chat {dcchat} is already bridged")]
    AlreadyBridged { dcchat: i64 },

    /// No link exists for the given Delta Chat group.
    #[error("chat {dcchat} is not bridged")]
    NotBridged { dcchat: i64 },

    /// Underlying database failure.
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
