//! Security-scoped bookmarks and scoped access
//!
//! A bookmark is an opaque token that re-grants access to one user-selected
//! file. Every filesystem touch on a resolved path happens inside a
//! [`ScopedAccess`] guard, which releases the scope when dropped: on normal
//! return, on `?` early return, on unwinding and when an async load is
//! dropped mid-flight.

use crate::error::BookmarkError;
use parking_lot::Mutex;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failure reported by a [`BookmarkProvider`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("{0}")]
    Failed(String),
}

impl From<ProviderError> for BookmarkError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(p) | ProviderError::AccessDenied(p) => {
                BookmarkError::AccessDenied(p)
            }
            ProviderError::Failed(msg) => BookmarkError::ResolutionFailed(msg),
        }
    }
}

/// What a provider reports when resolving a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResolution {
    pub path: PathBuf,
    pub is_stale: bool,
}

/// OS facility that issues and honours access grants
#[cfg_attr(test, mockall::automock)]
pub trait BookmarkProvider: Send + Sync {
    /// Create a token for `path`. `read_only` asks for the narrower grant.
    fn create(&self, path: &Path, read_only: bool) -> std::result::Result<Vec<u8>, ProviderError>;

    /// Resolve a token back to its path, reporting staleness
    fn resolve(&self, token: &[u8]) -> std::result::Result<ProviderResolution, ProviderError>;

    /// Start using a granted path. Returns false when no grant covers it.
    fn begin_access(&self, path: &Path) -> bool;

    /// Balance a successful [`begin_access`](Self::begin_access)
    fn end_access(&self, path: &Path);
}

/// Acquired access scope on one path, released on drop
#[must_use = "access is released as soon as the guard is dropped"]
pub struct ScopedAccess {
    provider: Arc<dyn BookmarkProvider>,
    path: PathBuf,
}

impl ScopedAccess {
    /// Begin access on `path`. Returns `None` when the provider refuses.
    pub fn acquire(provider: &Arc<dyn BookmarkProvider>, path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        if !provider.begin_access(&path) {
            debug!("Scoped access refused for {:?}", path);
            return None;
        }
        debug!("Scoped access started for {:?}", path);
        Some(Self {
            provider: Arc::clone(provider),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScopedAccess {
    fn drop(&mut self) {
        self.provider.end_access(&self.path);
        debug!("Scoped access ended for {:?}", self.path);
    }
}

impl std::fmt::Debug for ScopedAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedAccess").field("path", &self.path).finish()
    }
}

/// Stored token bound to the path it was created for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub token: Vec<u8>,
    pub path: PathBuf,
}

/// Result of resolving a stored bookmark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: PathBuf,
    /// The provider reported the token as stale. When set, the stored token
    /// has already been regenerated.
    pub is_stale: bool,
}

/// Bookmark state for one document.
///
/// All token reads and writes go through one mutex, so concurrent resolves
/// of the same document cannot both repair a stale token.
pub struct SecurityScopedBookmarkStore {
    provider: Arc<dyn BookmarkProvider>,
    bookmark: Mutex<Option<Bookmark>>,
}

impl SecurityScopedBookmarkStore {
    pub fn new(provider: Arc<dyn BookmarkProvider>) -> Self {
        Self {
            provider,
            bookmark: Mutex::new(None),
        }
    }

    /// Restore a store from a persisted token
    pub fn from_token(
        provider: Arc<dyn BookmarkProvider>,
        token: Vec<u8>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider,
            bookmark: Mutex::new(Some(Bookmark {
                token,
                path: path.into(),
            })),
        }
    }

    pub fn provider(&self) -> &Arc<dyn BookmarkProvider> {
        &self.provider
    }

    /// Current bookmark, if any
    pub fn bookmark(&self) -> Option<Bookmark> {
        self.bookmark.lock().clone()
    }

    /// Create a bookmark for `path`, replacing any existing one.
    ///
    /// On failure the previous bookmark is kept.
    pub fn create_bookmark(&self, path: &Path) -> std::result::Result<Bookmark, BookmarkError> {
        let mut slot = self.bookmark.lock();
        let token = self.create_token(path)?;
        let bookmark = Bookmark {
            token,
            path: path.to_path_buf(),
        };
        *slot = Some(bookmark.clone());
        info!("Created bookmark for {:?}", path);
        Ok(bookmark)
    }

    /// Resolve the stored token, repairing it in place if it is stale.
    pub fn resolve_bookmark(&self) -> std::result::Result<Resolution, BookmarkError> {
        let mut slot = self.bookmark.lock();
        let current = slot.as_ref().ok_or(BookmarkError::MissingBookmark)?;

        let resolved = self.provider.resolve(&current.token)?;

        if resolved.is_stale {
            info!("Bookmark for {:?} is stale, regenerating", resolved.path);
            let fresh = {
                let _scope = ScopedAccess::acquire(&self.provider, &resolved.path).ok_or_else(
                    || BookmarkError::AccessDenied(resolved.path.to_string_lossy().to_string()),
                )?;
                self.create_token(&resolved.path).map_err(|e| {
                    warn!("Failed to regenerate stale bookmark: {}", e);
                    e
                })?
            };
            *slot = Some(Bookmark {
                token: fresh,
                path: resolved.path.clone(),
            });
        }

        Ok(Resolution {
            path: resolved.path,
            is_stale: resolved.is_stale,
        })
    }

    /// Resolve and run `f` on the path while holding scoped access
    pub fn with_access<R>(
        &self,
        f: impl FnOnce(&Path) -> R,
    ) -> std::result::Result<R, BookmarkError> {
        let resolution = self.resolve_bookmark()?;
        let scope = self.acquire(&resolution.path)?;
        Ok(f(scope.path()))
    }

    /// Async form of [`with_access`](Self::with_access). The scope is held
    /// until the future completes or is dropped.
    pub async fn with_access_async<F, Fut, R>(
        &self,
        f: F,
    ) -> std::result::Result<R, BookmarkError>
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = R>,
    {
        let resolution = self.resolve_bookmark()?;
        let _scope = self.acquire(&resolution.path)?;
        Ok(f(resolution.path).await)
    }

    fn acquire(&self, path: &Path) -> std::result::Result<ScopedAccess, BookmarkError> {
        ScopedAccess::acquire(&self.provider, path)
            .ok_or_else(|| BookmarkError::AccessDenied(path.to_string_lossy().to_string()))
    }

    /// Ask for a read-only grant, falling back to read-write
    fn create_token(&self, path: &Path) -> std::result::Result<Vec<u8>, BookmarkError> {
        match self.provider.create(path, true) {
            Ok(token) => Ok(token),
            Err(read_only_err) => {
                debug!(
                    "Read-only bookmark refused for {:?} ({}), trying read-write",
                    path, read_only_err
                );
                self.provider.create(path, false).map_err(BookmarkError::from)
            }
        }
    }
}

impl std::fmt::Debug for SecurityScopedBookmarkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityScopedBookmarkStore")
            .field("bookmark", &*self.bookmark.lock())
            .finish()
    }
}
