//! File system reads for sandboxed paths
//!
//! These helpers do not acquire scoped access themselves; callers hold a
//! [`ScopedAccess`](super::ScopedAccess) guard for the duration of the call.

use crate::error::{Error, Result, SandboxError};
use crate::types::DocumentMetadata;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// File system handler for scoped reads
pub struct FileSystemHandler;

impl FileSystemHandler {
    /// Read a file as bytes
    pub async fn read_file_bytes(path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let path = path.as_ref();
        debug!("Reading file bytes: {:?}", path);
        fs::read(path).await.map_err(|e| map_io_error(path, e))
    }

    /// Read a text file
    pub async fn read_text_file(path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        debug!("Reading file: {:?}", path);
        fs::read_to_string(path).await.map_err(|e| map_io_error(path, e))
    }

    /// Size and modification date, stamped with the refresh time
    pub async fn get_metadata(path: impl AsRef<Path>) -> Result<DocumentMetadata> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).await.map_err(|e| map_io_error(path, e))?;

        Ok(DocumentMetadata {
            size: metadata.is_file().then(|| metadata.len()),
            modified: metadata.modified().ok().map(|t| t.into()),
            refreshed_at: Some(chrono::Utc::now()),
        })
    }
}

fn map_io_error(path: &Path, err: std::io::Error) -> Error {
    let display = path.to_string_lossy().to_string();
    match err.kind() {
        std::io::ErrorKind::NotFound => Error::Sandbox(SandboxError::FileNotFound(display)),
        std::io::ErrorKind::PermissionDenied => Error::Sandbox(SandboxError::AccessDenied(display)),
        _ => Error::Io(err),
    }
}

/// Lexically normalize a path without touching the filesystem.
///
/// `.` components are dropped and `..` pops the previous component. A `..`
/// at the root stays at the root; on a relative path with nothing left to
/// pop it is kept.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }

    components.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_read_file_bytes() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("img.bin");
        std::fs::write(&file_path, [1u8, 2, 3]).unwrap();

        let bytes = FileSystemHandler::read_file_bytes(&file_path).await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_missing_file_maps_to_not_found() {
        let dir = tempdir().unwrap();
        let result = FileSystemHandler::read_file_bytes(dir.path().join("nope.png")).await;
        assert!(matches!(
            result,
            Err(Error::Sandbox(SandboxError::FileNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_get_metadata() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("doc.md");
        std::fs::write(&file_path, "hello").unwrap();

        let metadata = FileSystemHandler::get_metadata(&file_path).await.unwrap();
        assert_eq!(metadata.size, Some(5));
        assert!(metadata.modified.is_some());
        assert!(metadata.refreshed_at.is_some());
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(Path::new("/docs/./my file.png")), PathBuf::from("/docs/my file.png"));
        assert_eq!(clean_path(Path::new("/docs/sub/../a.png")), PathBuf::from("/docs/a.png"));
        assert_eq!(clean_path(Path::new("/../../a.png")), PathBuf::from("/a.png"));
        assert_eq!(clean_path(Path::new("../a.png")), PathBuf::from("../a.png"));
    }
}
