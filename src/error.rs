//! Error types for fetching and loading project resources

use thiserror::Error;

/// A resource could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure: DNS, connection, TLS, timeout
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: ureq::Error,
    },

    /// The server answered with a non-success status
    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read
    #[error("failed to read response from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: ureq::Error,
    },
}

impl FetchError {
    /// URL of the resource that failed
    pub fn url(&self) -> &str {
        match self {
            FetchError::Request { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Body { url, .. } => url,
        }
    }
}

/// The runner could not load a project
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The project document is not a project the runner understands
    #[error("project {id} is not a valid project document: {source}")]
    InvalidProject {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message() {
        let err = FetchError::Status {
            url: "https://example.com/a".to_string(),
            status: 404,
        };
        assert_eq!(err.to_string(), "https://example.com/a responded with HTTP 404");
        assert_eq!(err.url(), "https://example.com/a");
    }

    #[test]
    fn test_load_error_is_transparent_for_fetch() {
        let err = LoadError::from(FetchError::Status {
            url: "x".to_string(),
            status: 500,
        });
        assert_eq!(err.to_string(), "x responded with HTTP 500");
    }
}
