//! Secure resource loader
//!
//! Loads the bytes behind a classified [`ImageSource`]. Every load is an
//! independent async unit; many images of one document resolve concurrently.
//! Failures are values in [`LoadResult`], never errors, so one bad image
//! cannot abort rendering of the rest of the document.

use super::remote::{ProgressReporter, RemoteFetcher};
use crate::config::ScopePolicy;
use crate::error::{Error, SandboxError};
use crate::sandbox::{BookmarkProvider, FileSystemHandler, ScopedAccess};
use crate::types::{ImageSource, LoadFailure, LoadResult, LoadedImage};
use parking_lot::Mutex;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Counters kept by the loader
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoaderStats {
    pub in_flight: usize,
    pub succeeded: u64,
    pub missing: u64,
    pub corrupt: u64,
    pub unreachable: u64,
    pub cancelled: u64,
}

impl LoaderStats {
    fn record(&mut self, result: &LoadResult) {
        match result.failure() {
            None => self.succeeded += 1,
            Some(LoadFailure::Missing) => self.missing += 1,
            Some(LoadFailure::Corrupt) => self.corrupt += 1,
            Some(LoadFailure::Unreachable) => self.unreachable += 1,
            Some(LoadFailure::Cancelled) => self.cancelled += 1,
        }
    }
}

/// Decrements the in-flight count even when the load future is dropped
struct InFlight<'a> {
    stats: &'a Mutex<LoaderStats>,
}

impl<'a> InFlight<'a> {
    fn enter(stats: &'a Mutex<LoaderStats>) -> Self {
        stats.lock().in_flight += 1;
        Self { stats }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.stats.lock().in_flight -= 1;
    }
}

/// Loads image bytes from local, sidecar and remote sources
pub struct SecureResourceLoader {
    provider: Arc<dyn BookmarkProvider>,
    fetcher: Arc<dyn RemoteFetcher>,
    policy: ScopePolicy,
    /// Only touched between suspension points
    stats: Mutex<LoaderStats>,
}

impl SecureResourceLoader {
    pub fn new(
        provider: Arc<dyn BookmarkProvider>,
        fetcher: Arc<dyn RemoteFetcher>,
        policy: ScopePolicy,
    ) -> Self {
        Self {
            provider,
            fetcher,
            policy,
            stats: Mutex::new(LoaderStats::default()),
        }
    }

    pub fn stats(&self) -> LoaderStats {
        self.stats.lock().clone()
    }

    /// Load one source. `document_location` is used as a fallback scope for
    /// local paths that have no grant of their own.
    pub async fn load(
        &self,
        source: &ImageSource,
        document_location: Option<&Path>,
        progress: ProgressReporter,
        cancel: &CancellationToken,
    ) -> LoadResult {
        let _in_flight = InFlight::enter(&self.stats);

        let result = if cancel.is_cancelled() {
            LoadFailure::Cancelled.into()
        } else {
            match source {
                ImageSource::Absolute { path } | ImageSource::DocumentRelative { path } => {
                    self.load_scoped(path, document_location, cancel).await
                }
                ImageSource::Sidecar {
                    resolved: Some(path),
                    ..
                } => read_image(path, cancel).await,
                ImageSource::Sidecar {
                    name,
                    resolved: None,
                } => {
                    debug!("Sidecar image {:?} not found", name);
                    LoadFailure::Missing.into()
                }
                ImageSource::Remote { url } => self.load_remote(url, progress, cancel).await,
            }
        };

        self.stats.lock().record(&result);
        match result.failure() {
            None => debug!("Loaded {:?}", source),
            Some(LoadFailure::Cancelled) => debug!("Load cancelled for {:?}", source),
            Some(reason) => info!("Load failed for {:?}: {:?}", source, reason),
        }
        result
    }

    async fn load_scoped(
        &self,
        path: &Path,
        document_location: Option<&Path>,
        cancel: &CancellationToken,
    ) -> LoadResult {
        let _scope = if self.policy.requires_scope(path) {
            self.acquire_scope(path, document_location)
        } else {
            None
        };
        read_image(path, cancel).await
    }

    fn acquire_scope(&self, path: &Path, document_location: Option<&Path>) -> Option<ScopedAccess> {
        if let Some(scope) = ScopedAccess::acquire(&self.provider, path) {
            return Some(scope);
        }
        if let Some(dir) = document_location.and_then(Path::parent) {
            if let Some(scope) = ScopedAccess::acquire(&self.provider, dir) {
                return Some(scope);
            }
        }
        // The read itself reports the denial
        warn!("No scoped access for {:?}, reading without scope", path);
        None
    }

    async fn load_remote(
        &self,
        url: &str,
        progress: ProgressReporter,
        cancel: &CancellationToken,
    ) -> LoadResult {
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return LoadFailure::Cancelled.into(),
            fetched = self.fetcher.fetch(url, &progress, cancel) => fetched,
        };

        match fetched {
            Ok(bytes) => decode_image(bytes),
            Err(e) => {
                debug!("Fetch failed for {}: {}", url, e);
                e.into_failure().into()
            }
        }
    }
}

async fn read_image(path: &Path, cancel: &CancellationToken) -> LoadResult {
    let read = tokio::select! {
        biased;
        _ = cancel.cancelled() => return LoadFailure::Cancelled.into(),
        read = FileSystemHandler::read_file_bytes(path) => read,
    };

    match read {
        Ok(bytes) => decode_image(bytes),
        Err(Error::Sandbox(SandboxError::FileNotFound(_))) => LoadFailure::Missing.into(),
        Err(Error::Sandbox(SandboxError::AccessDenied(p))) => {
            warn!("Permission denied reading {}", p);
            LoadFailure::Missing.into()
        }
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            LoadFailure::Missing.into()
        }
    }
}

/// Sniff the format and decode the whole image; a truncated body is corrupt
fn decode_image(bytes: Vec<u8>) -> LoadResult {
    let reader = match image::ImageReader::new(Cursor::new(&bytes)).with_guessed_format() {
        Ok(reader) => reader,
        Err(_) => return LoadFailure::Corrupt.into(),
    };
    let Some(format) = reader.format() else {
        return LoadFailure::Corrupt.into();
    };
    let decoded = match reader.decode() {
        Ok(decoded) => decoded,
        Err(e) => {
            debug!("Undecodable {:?} image: {}", format, e);
            return LoadFailure::Corrupt.into();
        }
    };
    LoadResult::Success(LoadedImage {
        width: decoded.width(),
        height: decoded.height(),
        bytes,
        format,
    })
}
