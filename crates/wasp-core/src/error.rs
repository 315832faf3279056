use thiserror::Error;

/// The error taxonomy surfaced by every `wasp-core` operation.
///
/// Each variant maps to exactly one HTTP status in `wasp-server` and one
/// CLI exit behavior in `wasp-cli`.
#[derive(Debug, Error)]
pub enum WaspError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store not initialized")]
    NotInitialized,

    #[error("storage failure: {0}")]
    StorageFailure(#[source] Box<sqlx::Error>),

    #[error("unauthorized")]
    Unauthorized,

    #[error("rate limited")]
    RateLimited,

    #[error("misconfigured: {0}")]
    Misconfigured(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<sqlx::Error> for WaspError {
    fn from(err: sqlx::Error) -> Self {
        WaspError::StorageFailure(Box::new(err))
    }
}

pub type WaspResult<T> = Result<T, WaspError>;
