//! LLM error types.

use thiserror::Error;

/// Errors from greeting generation.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the API.
    #[error("api error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, if readable.
        message: String,
    },

    /// Response body could not be interpreted.
    #[error("parse error: {0}")]
    Parse(String),

    /// The model returned no usable text.
    #[error("empty response from model")]
    EmptyResponse,
}

/// Result type alias for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;
