//! Recent document types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Best-effort metadata for a recent document.
///
/// Values may lag behind the file on disk; they are refreshed whenever the
/// document is opened and scoped access is held anyway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub size: Option<u64>,
    pub modified: Option<chrono::DateTime<chrono::Utc>>,
    pub refreshed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A document in the Recents list, owning its bookmark token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentDocumentRecord {
    pub id: String,
    pub path: PathBuf,
    pub display_name: String,
    /// Opaque bookmark token bytes
    pub bookmark: Vec<u8>,
    pub metadata: DocumentMetadata,
    pub last_opened_at: chrono::DateTime<chrono::Utc>,
}

impl RecentDocumentRecord {
    pub fn new(path: PathBuf, bookmark: Vec<u8>) -> Self {
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            path,
            display_name,
            bookmark,
            metadata: DocumentMetadata::default(),
            last_opened_at: chrono::Utc::now(),
        }
    }
}
