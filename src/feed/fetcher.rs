use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::feed::parser::{parse_document, FeedDocument, ParseError};

/// Per-request budget covering connect, headers, and body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB
const USER_AGENT: &str = "gator";

/// Errors that can occur while fetching one feed document.
///
/// None of these are retried inside the fetcher; the scheduler simply tries
/// the feed again when it next becomes the least recently fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request plus body read exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Body is not valid UTF-8
    #[error("Response body is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),
    /// Body is not an RSS document
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    /// The enclosing process asked to stop
    #[error("Fetch cancelled")]
    Cancelled,
}

/// HTTP client for feed documents.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl FeedFetcher {
    /// Build a fetcher with the default 30 second timeout and `User-Agent: gator`.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, timeout })
    }

    /// Fetches `url` and returns its channel with HTML entities decoded.
    ///
    /// Performs a single GET. The timeout covers the whole exchange including
    /// the body; `cancel` aborts the request at any point.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] - connection, TLS, or body stream errors
    /// - [`FetchError::Timeout`] - the exchange took longer than the timeout
    /// - [`FetchError::HttpStatus`] - non-2xx response
    /// - [`FetchError::ResponseTooLarge`] - body over 10MB
    /// - [`FetchError::Decode`] - body is not UTF-8
    /// - [`FetchError::Parse`] - malformed XML or no `<channel>`
    /// - [`FetchError::Cancelled`] - `cancel` fired first
    pub async fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<FeedDocument, FetchError> {
        let bytes = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            result = tokio::time::timeout(self.timeout, self.download(url)) => {
                result.map_err(|_| FetchError::Timeout(self.timeout))??
            }
        };

        let body = std::str::from_utf8(&bytes)?;
        let document = parse_document(body)?;

        Ok(document.unescape_html())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, MAX_FEED_SIZE).await
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
