//! HTTP fetch capability
//!
//! The pipeline only needs three things from the network: the text of an
//! upstream page, the bytes of a small resource, and the body of an artifact
//! streamed into a file. [`Fetcher`] captures exactly that so the
//! [`PackageUpdater`](crate::updater::PackageUpdater) can be driven by a mock
//! in tests and by [`HttpFetcher`] in production.
//!
//! # Retry Policy
//!
//! Retries belong here and not in the update state machine. [`HttpFetcher`]
//! retries connection failures, `429` and `5xx` responses with exponential
//! backoff; a `404` or any other client error fails immediately. Once a
//! download body has started streaming it is never retried, since the
//! destination file would already hold a prefix of the artifact.

use crate::constants::{
    BACKOFF_FACTOR_MS, DEFAULT_ACCEPT, DEFAULT_CACHE_CONTROL, DEFAULT_RETRIES, DEFAULT_TIMEOUT,
    DEFAULT_USER_AGENT, MAX_BACKOFF_DELAY_MS,
};
use crate::core::UpdaterError;
use reqwest::header::{ACCEPT, CACHE_CONTROL, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, warn};

/// Network capability used by the update pipeline.
///
/// Implementations report failures as [`UpdaterError::FetchFailed`] or
/// [`UpdaterError::HttpStatus`]; they never panic on network problems.
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return the response body decoded as text.
    fn fetch_text(&self, url: &str) -> impl Future<Output = Result<String, UpdaterError>> + Send;

    /// Fetch `url` and return the raw response body.
    fn fetch_bytes(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, UpdaterError>> + Send;

    /// Write the body of `url` into `file`, returning the number of bytes written.
    ///
    /// The default implementation buffers the whole body through
    /// [`fetch_bytes`](Self::fetch_bytes); [`HttpFetcher`] streams it instead.
    fn download_into(
        &self,
        url: &str,
        file: &mut tokio::fs::File,
    ) -> impl Future<Output = Result<u64, UpdaterError>> + Send {
        async move {
            let bytes = self.fetch_bytes(url).await?;
            file.write_all(&bytes).await?;
            Ok(bytes.len() as u64)
        }
    }
}

/// Settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherOptions {
    /// Connect and read timeout applied to every request
    pub timeout: Duration,
    /// Retries after the first failed attempt (0 disables retrying)
    pub retries: usize,
    /// Headers merged over the defaults (user agent, accept-all, no-cache)
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            extra_headers: BTreeMap::new(),
        }
    }
}

/// [`Fetcher`] backed by a shared `reqwest` client.
///
/// # Examples
///
/// ```rust,no_run
/// use aur_updater::fetcher::{Fetcher, FetcherOptions, HttpFetcher};
///
/// # async fn example() -> anyhow::Result<()> {
/// let fetcher = HttpFetcher::new(FetcherOptions::default())?;
/// let page = fetcher.fetch_text("https://im.qq.com/linuxqq/index.shtml").await?;
/// println!("{} bytes", page.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    retries: usize,
}

impl HttpFetcher {
    /// Build a fetcher with the default headers merged with `options.extra_headers`.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::ConfigError`] if an extra header name or value is
    /// not valid HTTP, or if the client cannot be constructed.
    pub fn new(options: FetcherOptions) -> Result<Self, UpdaterError> {
        let headers = default_headers(&options.extra_headers)?;

        // Per-connect and per-read limits; no whole-request deadline.
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(options.timeout)
            .read_timeout(options.timeout)
            .build()
            .map_err(|e| UpdaterError::ConfigError {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            retries: options.retries,
        })
    }

    fn retry_strategy(&self) -> impl Iterator<Item = Duration> + use<> {
        ExponentialBackoff::from_millis(2)
            .factor(BACKOFF_FACTOR_MS)
            .max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS))
            .take(self.retries)
    }

    /// Send a GET request, retrying transient failures, and return the
    /// response once its status is a success.
    async fn get(&self, url: &str) -> Result<reqwest::Response, UpdaterError> {
        RetryIf::spawn(
            self.retry_strategy(),
            move || async move {
                debug!("GET {}", url);
                let response = self.client.get(url).send().await.map_err(|e| {
                    UpdaterError::FetchFailed {
                        url: url.to_string(),
                        reason: e.to_string(),
                    }
                })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(UpdaterError::HttpStatus {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
                Ok(response)
            },
            |error: &UpdaterError| {
                let transient = is_transient(error);
                if transient {
                    warn!("Retrying after transient failure: {}", error);
                }
                transient
            },
        )
        .await
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, UpdaterError> {
        let response = self.get(url).await?;
        response.text().await.map_err(|e| UpdaterError::FetchFailed {
            url: url.to_string(),
            reason: format!("failed to read body: {e}"),
        })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, UpdaterError> {
        let response = self.get(url).await?;
        response.bytes().await.map(|b| b.to_vec()).map_err(|e| UpdaterError::FetchFailed {
            url: url.to_string(),
            reason: format!("failed to read body: {e}"),
        })
    }

    async fn download_into(
        &self,
        url: &str,
        file: &mut tokio::fs::File,
    ) -> Result<u64, UpdaterError> {
        let mut response = self.get(url).await?;
        let mut written = 0u64;

        while let Some(chunk) = response.chunk().await.map_err(|e| UpdaterError::FetchFailed {
            url: url.to_string(),
            reason: format!("download interrupted after {written} bytes: {e}"),
        })? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(written)
    }
}

/// Connection failures, rate limiting and server errors are worth retrying.
fn is_transient(error: &UpdaterError) -> bool {
    match error {
        UpdaterError::FetchFailed { .. } => true,
        UpdaterError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

fn default_headers(extra: &BTreeMap<String, String>) -> Result<HeaderMap, UpdaterError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(DEFAULT_CACHE_CONTROL));

    for (name, value) in extra {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            UpdaterError::ConfigError {
                message: format!("invalid header name '{name}': {e}"),
            }
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| UpdaterError::ConfigError {
            message: format!("invalid value for header '{name}': {e}"),
        })?;
        headers.insert(name, value);
    }

    Ok(headers)
}
