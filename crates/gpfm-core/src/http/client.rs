//! HTTP client wrapping `reqwest`.
//!
//! The wrapper adds the pieces every request in this crate needs:
//! - a descriptive User-Agent on every request
//! - non-success statuses turned into errors
//! - streaming downloads straight to disk
//!
//! Requests are not retried. A transport error or non-success status is
//! fatal for the source being processed, and a failed download may leave a
//! partially written file behind; the staging area it lands in is discarded
//! with the job either way.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

const DEFAULT_USER_AGENT: &str = concat!("gpfm/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization error: {0}")]
    JsonParse(String),
}

pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            user_agent: config.user_agent,
        })
    }

    /// Perform a GET request. Any non-success status is an error.
    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }

    /// GET JSON and deserialize.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, HttpError> {
        let response = self.get(url).await?;
        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| HttpError::JsonParse(e.to_string()))
    }

    /// Download a file, streaming the response body to `dest`.
    ///
    /// Parent directories are created as needed. The optional callback
    /// receives `(downloaded, total)` byte counts; `total` is zero when the
    /// server sends no Content-Length.
    pub async fn download<F>(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<F>,
    ) -> Result<(), HttpError>
    where
        F: Fn(u64, u64),
    {
        let response = self.get(url).await?;
        let total_size = response.content_length().unwrap_or(0);

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = File::create(dest).await?;
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if let Some(ref callback) = progress {
                callback(downloaded, total_size);
            }
        }

        file.flush().await?;

        Ok(())
    }

    /// The configured user agent.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();

        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(config.user_agent.starts_with("gpfm/"));
    }

    #[test]
    fn test_config_builder() {
        let config = HttpClientConfig::new()
            .with_timeout(Duration::from_secs(60))
            .with_connect_timeout(Duration::from_secs(5))
            .with_user_agent("Test/1.0".to_string());

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "Test/1.0");
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
        assert_eq!(client.unwrap().user_agent(), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_http_error_display() {
        let err = HttpError::HttpStatus {
            status: 404,
            url: "https://example.com/not-found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404: https://example.com/not-found");
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_error_404() {
        let client = HttpClient::new().unwrap();
        let response = client.get("https://httpbin.org/status/404").await;

        match response {
            Err(HttpError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected HttpStatus error, got {other:?}"),
        }
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_download_file() {
        use tempfile::TempDir;

        let client = HttpClient::new().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("test_file.bin");

        let result = client
            .download("https://httpbin.org/bytes/100", &dest, None::<fn(u64, u64)>)
            .await;

        assert!(result.is_ok());
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 100);
    }
}
