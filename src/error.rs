//! Error types for the scraper.

use thiserror::Error;

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Errors that can occur while configuring or running a scrape.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Invalid configuration, e.g. an empty proxy list.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed at the transport level.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status.
    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    /// Request exceeded the per-request timeout.
    #[error("Request timeout exceeded")]
    Timeout,

    /// Response body could not be decoded as JSON.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl ScrapeError {
    /// Returns whether the error is a per-request failure worth retrying.
    ///
    /// Transient errors are absorbed below the page level. Anything else
    /// aborts the scrape.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ScrapeError::Http(_) | ScrapeError::Status(_) | ScrapeError::Timeout | ScrapeError::Decode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let err = ScrapeError::Config("no proxies configured".to_string());
        assert_eq!(err.to_string(), "Configuration error: no proxies configured");
    }

    #[test]
    fn test_error_display_status() {
        let err = ScrapeError::Status(403);
        assert_eq!(err.to_string(), "Unexpected HTTP status 403");
    }

    #[test]
    fn test_error_display_timeout() {
        let err = ScrapeError::Timeout;
        assert_eq!(err.to_string(), "Request timeout exceeded");
    }

    #[test]
    fn test_error_display_decode() {
        let err = ScrapeError::Decode("expected value".to_string());
        assert_eq!(err.to_string(), "Failed to decode response: expected value");
    }

    #[test]
    fn test_error_display_other() {
        let err = ScrapeError::Other("something went wrong".to_string());
        assert_eq!(err.to_string(), "something went wrong");
    }

    #[test]
    fn test_error_from_url_parse() {
        let err: ScrapeError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, ScrapeError::UrlParse(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_transient_classification() {
        assert!(ScrapeError::Status(503).is_transient());
        assert!(ScrapeError::Timeout.is_transient());
        assert!(ScrapeError::Decode("bad".into()).is_transient());
        assert!(!ScrapeError::Config("bad".into()).is_transient());
        assert!(!ScrapeError::Other("bad".into()).is_transient());
    }
}
