//! Downloading the updater archive into memory.
//!
//! The HTTP client sits behind the [`HttpClient`] trait so the installer can
//! be exercised with mock clients in tests.

use std::io::Cursor;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::Url;

use super::error::{UpdaterError, UpdaterResult};

/// Default bound on the whole download, connect through last body byte.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for HTTP client operations.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the full body.
    ///
    /// Implementations must treat any status other than 200 as a failure.
    fn get(&self, url: &str) -> UpdaterResult<Vec<u8>>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with the default 30 second deadline.
    pub fn new() -> UpdaterResult<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new ReqwestClient with a custom deadline.
    pub fn with_timeout(timeout: Duration) -> UpdaterResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpdaterError::NetworkFailure {
                url: String::new(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, timeout })
    }

    fn classify(&self, url: &str, err: reqwest::Error, when_reading: bool) -> UpdaterError {
        if err.is_timeout() {
            UpdaterError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else if when_reading {
            UpdaterError::ReadFailure {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else {
            UpdaterError::NetworkFailure {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> UpdaterResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| self.classify(url, e, false))?;

        if response.status() != StatusCode::OK {
            return Err(UpdaterError::HttpStatusFailure {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| self.classify(url, e, true))
    }
}

/// A downloaded archive held entirely in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePayload {
    bytes: Vec<u8>,
}

impl ArchivePayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Declared length in bytes.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Random-access reader over the buffer.
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(&self.bytes)
    }
}

/// Check that a URL is a syntactically valid absolute HTTP(S) URL.
pub fn validate_url(raw: &str) -> UpdaterResult<Url> {
    let invalid = |reason: String| UpdaterError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    Ok(url)
}

/// Fetches the updater archive.
pub struct Acquirer<'a, C: HttpClient> {
    client: &'a C,
}

impl<'a, C: HttpClient> Acquirer<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Validate the URL, then download the body in full.
    ///
    /// A malformed URL fails locally without any request being made.
    pub fn fetch(&self, url: &str) -> UpdaterResult<ArchivePayload> {
        let url = validate_url(url)?;
        tracing::debug!(url = %url, "Validated download URL");

        let bytes = self.client.get(url.as_str())?;
        tracing::debug!(url = %url, bytes = bytes.len(), "Downloaded archive");

        Ok(ArchivePayload::new(bytes))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock HTTP client for testing
    pub struct MockHttpClient {
        /// Body to return, or a status code to fail with.
        pub response: Result<Vec<u8>, u16>,
        pub calls: AtomicUsize,
    }

    impl MockHttpClient {
        pub fn ok(body: Vec<u8>) -> Self {
            Self {
                response: Ok(body),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn status(status: u16) -> Self {
            Self {
                response: Err(status),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HttpClient for MockHttpClient {
        fn get(&self, url: &str) -> UpdaterResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(body) => Ok(body.clone()),
                Err(status) => Err(UpdaterError::HttpStatusFailure {
                    url: url.to_string(),
                    status: *status,
                }),
            }
        }
    }

    #[test]
    fn test_validate_url_accepts_https() {
        let url = validate_url("https://steamcdn-a.akamaihd.net/client/installer/steamcmd.zip");
        assert!(url.is_ok());
    }

    #[test]
    fn test_validate_url_rejects_relative() {
        let err = validate_url("client/installer/steamcmd.zip").unwrap_err();
        assert!(matches!(err, UpdaterError::InvalidUrl { .. }));
    }

    #[test]
    fn test_validate_url_rejects_other_schemes() {
        assert!(validate_url("ftp://example.com/steamcmd.zip").is_err());
        assert!(validate_url("file:///tmp/steamcmd.zip").is_err());
    }

    #[test]
    fn test_fetch_invalid_url_makes_no_request() {
        let client = MockHttpClient::ok(vec![1, 2, 3]);
        let result = Acquirer::new(&client).fetch("not a url");

        assert!(matches!(result, Err(UpdaterError::InvalidUrl { .. })));
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn test_fetch_returns_payload() {
        let client = MockHttpClient::ok(vec![1, 2, 3, 4]);
        let payload = Acquirer::new(&client)
            .fetch("http://example.com/steamcmd.zip")
            .unwrap();

        assert_eq!(payload.len(), 4);
        assert_eq!(payload.as_bytes(), &[1, 2, 3, 4]);
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn test_fetch_propagates_status_failure() {
        let client = MockHttpClient::status(500);
        let result = Acquirer::new(&client).fetch("http://example.com/steamcmd.zip");

        assert!(matches!(
            result,
            Err(UpdaterError::HttpStatusFailure { status: 500, .. })
        ));
    }
}
