use thiserror::Error;

/// Failure of a store operation. Nothing is persisted when one is returned.
#[derive(Debug, Error)]
pub enum DbError {
    /// Malformed or out-of-range input, or a business rule was violated.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller lacks permission, or presented a stale session.
    #[error("access denied: {0}")]
    Auth(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl DbError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }
}

pub type DbResult<T> = Result<T, DbError>;
