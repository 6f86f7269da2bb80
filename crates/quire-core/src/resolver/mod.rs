//! Markdown image resolution
//!
//! This module provides:
//! - Classification of raw image destinations into typed sources
//! - The secure loader for local, sidecar and remote images
//! - The HTTP fetcher and progress reporting
//! - `LoadImageUseCase`, the entry point used by renderers

pub mod classifier;
mod loader;
pub mod remote;
mod use_case;

pub use classifier::classify;
pub use loader::{LoaderStats, SecureResourceLoader};
pub use remote::{
    FetchError, HttpRemoteFetcher, ProgressCallback, ProgressReporter, RemoteFetcher,
};
pub use use_case::{ImageRequest, LoadImageUseCase};
