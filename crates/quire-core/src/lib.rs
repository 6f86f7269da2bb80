//! Quire Core Library
//!
//! This crate provides the core functionality for Quire, including:
//! - Security-scoped bookmarks and scoped access to user-granted files
//! - Markdown image reference parsing and classification
//! - Cancellable loading of local, sidecar and remote images
//! - Recently opened documents with SQLite-based persistence
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       quire-core                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  markdown/     - Destination grammar, image reference scan  │
//! │  resolver/     - Classifier, secure loader, use case        │
//! │  sandbox/      - Bookmarks, grants, scoped reads, sidecars  │
//! │  recent/       - Recent documents and their bookmarks       │
//! │  storage/      - SQLite database, queries                   │
//! │  types/        - Shared type definitions                    │
//! │  config.rs     - JSON configuration                         │
//! │  error.rs      - Error types                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod markdown;
pub mod recent;
pub mod resolver;
pub mod sandbox;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{BookmarkError, Error, Result};
pub use types::*;

pub use config::{LoaderConfig, QuireConfig, ScopePolicy, SidecarConfig};

pub use markdown::{extract_image_references, parse_destination, ImageReference};

// Re-export resolver components
pub use resolver::{
    classify, FetchError, HttpRemoteFetcher, ImageRequest, LoadImageUseCase, LoaderStats,
    ProgressCallback, ProgressReporter, RemoteFetcher, SecureResourceLoader,
};

// Re-export sandbox components
pub use sandbox::{
    BookmarkProvider, DirectorySidecarLocator, FileSystemHandler, GrantTableBookmarkProvider,
    ScopedAccess, SecurityScopedBookmarkStore, SidecarLocator,
};

pub use recent::{OpenedDocument, RecentDocuments, DEFAULT_RECENT_LIMIT};

// Re-export storage
pub use storage::Storage;
