//! HTTP client abstraction for testability

use std::time::Duration;

use thiserror::Error;

/// Errors from a tile fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read response from {url}: {reason}")]
    Body { url: String, reason: String },
}

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request, returning the response body.
    fn get(&self, url: &str) -> Result<Vec<u8>, HttpError>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with a 30 second timeout.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("trailmap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| HttpError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| HttpError::Body {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Mock HTTP client that fails any URL containing one of `failing`.
    #[derive(Default)]
    pub struct MockHttpClient {
        pub failing: Vec<String>,
        pub requested: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        pub fn failing_on(patterns: &[&str]) -> Self {
            Self {
                failing: patterns.iter().map(|s| s.to_string()).collect(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for MockHttpClient {
        fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
            self.requested.lock().push(url.to_string());
            if self.failing.iter().any(|p| url.contains(p.as_str())) {
                Err(HttpError::Status {
                    url: url.to_string(),
                    status: 503,
                })
            } else {
                Ok(vec![0x89, b'P', b'N', b'G'])
            }
        }
    }

    #[test]
    fn test_mock_client_success() {
        let mock = MockHttpClient::default();
        assert_eq!(mock.get("http://example.com").unwrap(), vec![0x89, b'P', b'N', b'G']);
        assert_eq!(mock.requested.lock().len(), 1);
    }

    #[test]
    fn test_mock_client_error() {
        let mock = MockHttpClient::failing_on(&["openstreetmap"]);
        let err = mock.get("https://a.tile.openstreetmap.org/1/0/0.png").unwrap_err();
        assert!(matches!(err, HttpError::Status { status: 503, .. }));
    }

    #[test]
    fn test_http_error_display() {
        let err = HttpError::Status {
            url: "https://tiles.test/1/0/0.png".to_string(),
            status: 404,
        };
        assert_eq!(err.to_string(), "HTTP 404 from https://tiles.test/1/0/0.png");
    }
}
