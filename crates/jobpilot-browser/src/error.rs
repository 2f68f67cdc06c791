use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("chromium error: {0}")]
    ChromiumError(String),

    #[error("navigation failed: {0}")]
    NavigationError(String),

    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("evaluation failed: {0}")]
    EvaluationError(String),

    #[error("cookie error: {0}")]
    CookieError(String),

    #[error("surface closed")]
    SurfaceClosed,
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        Self::ChromiumError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BrowserError::SelectorNotFound("li.job-card-box".to_string());
        assert_eq!(err.to_string(), "selector not found: li.job-card-box");
    }
}
