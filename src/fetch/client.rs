//! Source bundle retrieval over HTTP or from the local filesystem.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::error::{IngestError, Result};

/// HTTP client settings
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    pub timeout: Duration,
    /// Total attempts per source, including the first one
    pub max_attempts: u32,
    /// Base delay between attempts; grows linearly with the attempt number
    pub retry_delay: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!("airspace-ingest/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(60),
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Fetches raw source bytes for a locator.
///
/// `http`/`https` locators are downloaded; `file://` URLs and plain paths are
/// read from disk.
#[derive(Clone)]
pub struct SourceFetcher {
    client: Client,
    max_attempts: u32,
    retry_delay: Duration,
}

impl SourceFetcher {
    pub fn new(settings: &FetchSettings) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            client,
            max_attempts: settings.max_attempts.max(1),
            retry_delay: settings.retry_delay,
        })
    }

    pub async fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        match Url::parse(locator) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                self.fetch_http(locator, url).await
            }
            Ok(url) if url.scheme() == "file" => {
                let path = url.to_file_path().map_err(|_| IngestError::Fetch {
                    locator: locator.to_string(),
                    reason: "not a local file path".to_string(),
                })?;
                read_local(locator, &path).await
            }
            // Windows drive letters parse as a one-letter scheme
            Ok(url) if url.scheme().len() > 1 => Err(IngestError::Fetch {
                locator: locator.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            }),
            _ => read_local(locator, Path::new(locator)).await,
        }
    }

    async fn fetch_http(&self, locator: &str, url: Url) -> Result<Vec<u8>> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.try_fetch_http(&url).await {
                Ok(bytes) => {
                    debug!("Fetched {} bytes from {}", bytes.len(), locator);
                    return Ok(bytes);
                }
                Err(failure) if failure.retryable && attempts < self.max_attempts => {
                    warn!(
                        "Fetching {} failed (attempt {}/{}): {}",
                        locator, attempts, self.max_attempts, failure.reason
                    );
                    tokio::time::sleep(self.retry_delay * attempts).await;
                }
                Err(failure) => {
                    return Err(IngestError::Fetch {
                        locator: locator.to_string(),
                        reason: failure.reason,
                    })
                }
            }
        }
    }

    async fn try_fetch_http(&self, url: &Url) -> std::result::Result<Vec<u8>, AttemptFailure> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(AttemptFailure::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptFailure {
                reason: format!("HTTP status {}", status),
                retryable: is_retryable_status(status),
            });
        }

        let body = response.bytes().await.map_err(AttemptFailure::transport)?;
        Ok(body.to_vec())
    }
}

/// One failed download attempt
struct AttemptFailure {
    reason: String,
    retryable: bool,
}

impl AttemptFailure {
    fn transport(e: reqwest::Error) -> Self {
        Self {
            reason: e.to_string(),
            retryable: true,
        }
    }
}

/// Server errors and rate limiting may clear up; other statuses are final
fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

async fn read_local(locator: &str, path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| IngestError::Fetch {
            locator: locator.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fetcher() -> SourceFetcher {
        SourceFetcher::new(&FetchSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn test_reads_plain_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"bundle").unwrap();

        let locator = file.path().to_str().unwrap().to_string();
        let bytes = fetcher().fetch(&locator).await.unwrap();
        assert_eq!(bytes, b"bundle");
    }

    #[tokio::test]
    async fn test_reads_file_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"bundle").unwrap();

        let locator = Url::from_file_path(file.path()).unwrap().to_string();
        let bytes = fetcher().fetch(&locator).await.unwrap();
        assert_eq!(bytes, b"bundle");
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_failure() {
        let result = fetcher().fetch("/definitely/not/here.kmz").await;
        assert!(matches!(result, Err(IngestError::Fetch { .. })));
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let result = fetcher().fetch("ftp://example.org/a.kmz").await;
        assert!(matches!(result, Err(IngestError::Fetch { .. })));
    }

    #[test]
    fn test_only_transient_statuses_are_retried() {
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::FORBIDDEN));
        assert!(!is_retryable_status(StatusCode::GONE));
    }
}
