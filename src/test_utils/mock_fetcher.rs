//! Scripted [`Fetcher`] for driving the pipeline without a network.

use crate::core::UpdaterError;
use crate::fetcher::Fetcher;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone)]
enum MockResponse {
    Body(Vec<u8>),
    Status(u16),
    Failure(String),
    /// Writes the prefix, then fails mid-stream
    Truncated(Vec<u8>),
}

/// A [`Fetcher`] answering from a fixed URL → response table.
///
/// URLs without a scripted response answer `404`. Every request is recorded
/// and can be inspected with [`calls`](Self::calls).
///
/// # Example
///
/// ```rust,no_run
/// use aur_updater::fetcher::Fetcher;
/// use aur_updater::test_utils::MockFetcher;
///
/// # async fn example() {
/// let fetcher = MockFetcher::new()
///     .with_text("https://example.com/", "<html></html>")
///     .with_status("https://example.com/a.deb", 503);
/// assert!(fetcher.fetch_text("https://example.com/").await.is_ok());
/// assert_eq!(fetcher.call_count("https://example.com/"), 1);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: HashMap<String, MockResponse>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    /// A fetcher with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, url: &str, response: MockResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    /// Answer `url` with a text body.
    #[must_use]
    pub fn with_text(self, url: &str, body: impl Into<String>) -> Self {
        self.with(url, MockResponse::Body(body.into().into_bytes()))
    }

    /// Answer `url` with a binary body.
    #[must_use]
    pub fn with_bytes(self, url: &str, body: Vec<u8>) -> Self {
        self.with(url, MockResponse::Body(body))
    }

    /// Answer `url` with a non-success HTTP status.
    #[must_use]
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with(url, MockResponse::Status(status))
    }

    /// Fail `url` at the transport level.
    #[must_use]
    pub fn with_failure(self, url: &str, reason: &str) -> Self {
        self.with(url, MockResponse::Failure(reason.to_string()))
    }

    /// Stream `prefix` for `url`, then fail as if the connection dropped.
    #[must_use]
    pub fn with_truncated(self, url: &str, prefix: Vec<u8>) -> Self {
        self.with(url, MockResponse::Truncated(prefix))
    }

    /// Every URL requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// How many times `url` was requested.
    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| u.as_str() == url).count()
    }

    fn respond(&self, url: &str) -> MockResponse {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses.get(url).cloned().unwrap_or(MockResponse::Status(404))
    }
}

fn status_error(url: &str, status: u16) -> UpdaterError {
    UpdaterError::HttpStatus {
        url: url.to_string(),
        status,
    }
}

fn failure(url: &str, reason: &str) -> UpdaterError {
    UpdaterError::FetchFailed {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

impl Fetcher for MockFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, UpdaterError> {
        let bytes = self.fetch_bytes(url).await?;
        String::from_utf8(bytes).map_err(|e| failure(url, &e.to_string()))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, UpdaterError> {
        match self.respond(url) {
            MockResponse::Body(body) => Ok(body),
            MockResponse::Status(status) => Err(status_error(url, status)),
            MockResponse::Failure(reason) => Err(failure(url, &reason)),
            MockResponse::Truncated(_) => Err(failure(url, "connection reset")),
        }
    }

    async fn download_into(&self, url: &str, file: &mut tokio::fs::File) -> Result<u64, UpdaterError> {
        match self.respond(url) {
            MockResponse::Body(body) => {
                file.write_all(&body).await?;
                file.flush().await?;
                Ok(body.len() as u64)
            }
            MockResponse::Status(status) => Err(status_error(url, status)),
            MockResponse::Failure(reason) => Err(failure(url, &reason)),
            MockResponse::Truncated(prefix) => {
                file.write_all(&prefix).await?;
                file.flush().await?;
                Err(failure(url, "connection reset"))
            }
        }
    }
}
