//! Remote image fetching

use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::types::LoadFailure;
use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Progress callback receiving fractions in `[0, 1]`
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Forwards progress to a callback, clamped to `[0, 1]` and never decreasing
#[derive(Clone, Default)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    last: Arc<Mutex<Option<f64>>>,
}

impl ProgressReporter {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// Reporter that drops every update
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn report(&self, fraction: f64) {
        let Some(callback) = &self.callback else {
            return;
        };
        if fraction.is_nan() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);

        let mut last = self.last.lock();
        if matches!(*last, Some(prev) if fraction <= prev) {
            return;
        }
        *last = Some(fraction);
        callback(fraction);
    }

    pub fn finish(&self) {
        self.report(1.0);
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("last", &*self.last.lock())
            .finish()
    }
}

/// Remote fetch failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Response larger than {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Fetch cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn into_failure(self) -> LoadFailure {
        match self {
            Self::InvalidUrl(_) | Self::Network(_) | Self::Timeout | Self::Status(_) => {
                LoadFailure::Unreachable
            }
            Self::TooLarge { .. } => LoadFailure::Corrupt,
            Self::Cancelled => LoadFailure::Cancelled,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Downloads remote image bytes
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Fetch `url`, reporting progress. Must return promptly with
    /// [`FetchError::Cancelled`] once `cancel` fires.
    async fn fetch(
        &self,
        url: &str,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<u8>, FetchError>;
}

/// HTTP(S) fetcher streaming the body chunk by chunk
pub struct HttpRemoteFetcher {
    client: Client,
    max_bytes: u64,
}

impl HttpRemoteFetcher {
    /// Fetcher with the default loader settings. Falls back to a plain
    /// client, with a warning, if those cannot be applied.
    pub fn new() -> Self {
        let config = LoaderConfig::default();
        Self::with_config(&config).unwrap_or_else(|e| {
            warn!("{}, using a default HTTP client", e);
            Self {
                client: Client::new(),
                max_bytes: config.max_remote_bytes,
            }
        })
    }

    /// Fetcher built from `config`. Invalid client settings are an error.
    pub fn with_config(config: &LoaderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.remote_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_bytes: config.max_remote_bytes,
        })
    }
}

impl Default for HttpRemoteFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteFetcher for HttpRemoteFetcher {
    async fn fetch(
        &self,
        url: &str,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<u8>, FetchError> {
        let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if !["http", "https"].contains(&parsed.scheme()) {
            return Err(FetchError::InvalidUrl(format!(
                "Unsupported scheme: {}",
                parsed.scheme()
            )));
        }

        info!("Fetching image: {}", url);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            response = self.client.get(parsed).send() => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let total = response.content_length();
        if total.is_some_and(|len| len > self.max_bytes) {
            return Err(FetchError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let mut body = Vec::with_capacity(total.unwrap_or(0) as usize);
        let mut stream = response.bytes_stream();
        progress.report(0.0);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                next = stream.next() => next,
            };
            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk?;
            body.extend_from_slice(&chunk);

            if body.len() as u64 > self.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            if let Some(total) = total.filter(|t| *t > 0) {
                progress.report(body.len() as f64 / total as f64);
            }
        }

        progress.finish();
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
