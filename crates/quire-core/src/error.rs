//! Error types for Quire Core

use thiserror::Error;

/// Main error type for Quire operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Bookmark error: {0}")]
    Bookmark(#[from] BookmarkError),

    #[error("Sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Security-scoped bookmark errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookmarkError {
    /// No token has been stored for the document
    #[error("No bookmark stored for this document")]
    MissingBookmark,

    /// The file was moved, deleted, or the grant was revoked
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Bookmark resolution failed: {0}")]
    ResolutionFailed(String),
}

impl BookmarkError {
    /// Recovery text suitable for a user-facing alert
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::MissingBookmark => "Open the document again to grant access to it.",
            Self::AccessDenied(_) | Self::ResolutionFailed(_) => {
                "Remove the document from Recents and open it again."
            }
        }
    }
}

/// Sandbox/filesystem errors
#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Connection pool error: {0}")]
    Pool(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(StorageError::Database(err.to_string()))
    }
}

impl From<r2d2::Error> for Error {
    fn from(err: r2d2::Error) -> Self {
        Error::Storage(StorageError::Pool(err.to_string()))
    }
}

impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;
