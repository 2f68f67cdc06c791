//! Engine error types.

use thiserror::Error;

/// Errors from discovery, filtering and delivery.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A required page element never appeared or was not usable.
    #[error("selector unavailable: {0}")]
    SelectorUnavailable(String),

    /// The detail payload for a candidate did not arrive in time.
    #[error("detail capture timed out for {0}")]
    DetailTimeout(String),

    /// The platform session is no longer authenticated.
    #[error("session expired")]
    SessionExpired,

    /// Login was not completed within the allowed window.
    #[error("login not completed in time")]
    LoginTimeout,

    /// A run is already in progress for this platform.
    #[error("a delivery run is already in progress")]
    AlreadyRunning,

    /// All attempts of a bounded retry were used up.
    #[error("retries exhausted: {0}")]
    RetriesExhausted(String),

    /// The run was cancelled cooperatively.
    #[error("cancelled")]
    Cancelled,

    /// Response payload could not be interpreted.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid configuration for this run.
    #[error(transparent)]
    Config(#[from] jobpilot_core::ConfigError),

    /// Browser automation failure.
    #[error(transparent)]
    Browser(#[from] jobpilot_browser::BrowserError),

    /// Database failure.
    #[error(transparent)]
    Database(#[from] jobpilot_db::DatabaseError),

    /// Raw query failure from the per-table modules.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Greeting generation failure.
    #[error(transparent)]
    Llm(#[from] jobpilot_llm::LlmError),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
