//! File system sandbox and access grants
//!
//! This module provides:
//! - Security-scoped bookmarks with scoped begin/end access
//! - A grant-table bookmark provider for platforms without one
//! - Scoped file reads and lexical path cleaning
//! - Sidecar image folder lookup

pub mod bookmark;
mod filesystem;
pub mod grants;
mod sidecar;

pub use bookmark::{
    Bookmark, BookmarkProvider, ProviderError, ProviderResolution, Resolution, ScopedAccess,
    SecurityScopedBookmarkStore,
};
pub use filesystem::{clean_path, FileSystemHandler};
pub use grants::{GrantEntry, GrantTableBookmarkProvider};
pub use sidecar::{DirectorySidecarLocator, SidecarLocator, DEFAULT_SIDECAR_SUFFIX};
