//! Grant-table bookmark provider
//!
//! Portable [`BookmarkProvider`] for platforms without an OS bookmark
//! service. Paths the user picked are recorded in a grant table; tokens are
//! small JSON documents, and resolving a token re-grants its path the way a
//! security-scoped bookmark does after a restart.

use super::bookmark::{BookmarkProvider, ProviderError, ProviderResolution};
use super::filesystem::clean_path;
use crate::error::{Error, Result, SandboxError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Current token format. Older tokens resolve as stale.
pub const TOKEN_VERSION: u32 = 2;

/// A granted path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantEntry {
    pub path: PathBuf,
    pub read_only: bool,
    pub granted_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TokenData {
    pub version: u32,
    pub path: PathBuf,
    pub canonical: PathBuf,
    pub read_only: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Default)]
struct GrantTable {
    entries: Vec<GrantEntry>,
    /// Open begin/end scopes per path
    active: HashMap<PathBuf, usize>,
}

impl GrantTable {
    fn covering(&self, path: &Path) -> Option<&GrantEntry> {
        self.entries.iter().find(|e| path.starts_with(&e.path))
    }

    fn insert(&mut self, path: PathBuf, read_only: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.path == path) {
            // A read-write grant is never narrowed by a later read-only one
            entry.read_only &= read_only;
            return;
        }
        self.entries.push(GrantEntry {
            path,
            read_only,
            granted_at: chrono::Utc::now(),
        });
    }
}

/// Bookmark provider backed by an in-process grant table
#[derive(Debug, Default)]
pub struct GrantTableBookmarkProvider {
    table: RwLock<GrantTable>,
}

impl GrantTableBookmarkProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user grant for a file or folder (e.g. from an open panel)
    pub fn grant(&self, path: impl AsRef<Path>, read_only: bool) -> Result<()> {
        let path = normalize_path(path.as_ref())?;
        info!("Granting access to: {:?}", path);
        self.table.write().insert(path, read_only);
        Ok(())
    }

    /// Revoke a grant
    pub fn revoke(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = normalize_path(path.as_ref())?;
        let mut table = self.table.write();
        let before = table.entries.len();
        table.entries.retain(|e| e.path != path);
        if table.entries.len() != before {
            info!("Revoked access to: {:?}", path);
        }
        Ok(())
    }

    /// Check if a path is covered by any grant
    pub fn is_granted(&self, path: impl AsRef<Path>) -> bool {
        match normalize_path(path.as_ref()) {
            Ok(path) => self.table.read().covering(&path).is_some(),
            Err(_) => false,
        }
    }

    /// List all granted paths
    pub fn granted_paths(&self) -> Vec<PathBuf> {
        self.table.read().entries.iter().map(|e| e.path.clone()).collect()
    }

    /// Number of scopes begun and not yet ended
    pub fn active_scopes(&self) -> usize {
        self.table.read().active.values().sum()
    }

    pub(crate) fn encode_token(data: &TokenData) -> std::result::Result<Vec<u8>, ProviderError> {
        serde_json::to_vec(data).map_err(|e| ProviderError::Failed(e.to_string()))
    }

    fn decode_token(token: &[u8]) -> std::result::Result<TokenData, ProviderError> {
        serde_json::from_slice(token)
            .map_err(|e| ProviderError::Failed(format!("Unreadable bookmark token: {}", e)))
    }
}

impl BookmarkProvider for GrantTableBookmarkProvider {
    fn create(&self, path: &Path, read_only: bool) -> std::result::Result<Vec<u8>, ProviderError> {
        let display = path.to_string_lossy().to_string();
        if !path.exists() {
            return Err(ProviderError::NotFound(display));
        }
        let canonical = normalize_path(path).map_err(|e| ProviderError::Failed(e.to_string()))?;

        {
            let table = self.table.read();
            let entry = table
                .covering(&canonical)
                .ok_or_else(|| ProviderError::AccessDenied(display.clone()))?;
            if !read_only && entry.read_only {
                return Err(ProviderError::AccessDenied(display));
            }
        }

        debug!("Creating bookmark token for {:?}", path);
        Self::encode_token(&TokenData {
            version: TOKEN_VERSION,
            path: path.to_path_buf(),
            canonical,
            read_only,
            created_at: chrono::Utc::now(),
        })
    }

    fn resolve(&self, token: &[u8]) -> std::result::Result<ProviderResolution, ProviderError> {
        let data = Self::decode_token(token)?;

        if !data.path.exists() {
            return Err(ProviderError::NotFound(data.path.to_string_lossy().to_string()));
        }
        let canonical =
            normalize_path(&data.path).map_err(|e| ProviderError::Failed(e.to_string()))?;

        let is_stale = data.version < TOKEN_VERSION || canonical != data.canonical;
        if is_stale {
            debug!(
                "Token for {:?} is stale (version {}, canonical {:?} -> {:?})",
                data.path, data.version, data.canonical, canonical
            );
        }

        // Resolving a bookmark re-grants what it names
        self.table.write().insert(canonical, data.read_only);

        Ok(ProviderResolution {
            path: data.path,
            is_stale,
        })
    }

    fn begin_access(&self, path: &Path) -> bool {
        let Ok(path) = normalize_path(path) else {
            return false;
        };
        let mut table = self.table.write();
        if table.covering(&path).is_none() {
            return false;
        }
        *table.active.entry(path).or_insert(0) += 1;
        true
    }

    fn end_access(&self, path: &Path) {
        let Ok(path) = normalize_path(path) else {
            return;
        };
        let mut table = self.table.write();
        match table.active.get_mut(&path) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                table.active.remove(&path);
            }
            None => warn!("Unbalanced end_access for {:?}", path),
        }
    }
}

/// Expand `~`, clean lexically, then canonicalize the longest existing prefix
pub(crate) fn normalize_path(path: &Path) -> Result<PathBuf> {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };
    let expanded = clean_path(&expanded);

    if expanded.exists() {
        return expanded.canonicalize().map_err(|e| {
            Error::Sandbox(SandboxError::InvalidPath(format!(
                "Failed to canonicalize path {:?}: {}",
                expanded, e
            )))
        });
    }

    // Canonicalize the nearest existing ancestor so /tmp -> /private/tmp style
    // symlinks still match granted roots
    let mut current = expanded.clone();
    let mut remaining = Vec::new();
    while !current.exists() {
        let Some(parent) = current.parent().map(Path::to_path_buf) else {
            break;
        };
        if let Some(name) = current.file_name() {
            remaining.push(name.to_owned());
        }
        current = parent;
    }

    let mut result = if current.exists() {
        current.canonicalize().unwrap_or(current)
    } else {
        current
    };
    for part in remaining.into_iter().rev() {
        result.push(part);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_grant_and_check() {
        let provider = GrantTableBookmarkProvider::new();
        let dir = tempdir().unwrap();

        assert!(!provider.is_granted(dir.path()));
        provider.grant(dir.path(), true).unwrap();
        assert!(provider.is_granted(dir.path()));
        assert!(provider.is_granted(dir.path().join("subdir/file.png")));
    }

    #[test]
    fn test_revoke() {
        let provider = GrantTableBookmarkProvider::new();
        let dir = tempdir().unwrap();

        provider.grant(dir.path(), false).unwrap();
        provider.revoke(dir.path()).unwrap();
        assert!(!provider.is_granted(dir.path()));
        assert!(provider.granted_paths().is_empty());
    }

    #[test]
    fn test_create_requires_grant() {
        let provider = GrantTableBookmarkProvider::new();
        let dir = tempdir().unwrap();
        let file = dir.path().join("doc.md");
        std::fs::write(&file, "# hi").unwrap();

        assert!(matches!(provider.create(&file, true), Err(ProviderError::AccessDenied(_))));
        provider.grant(&file, true).unwrap();
        assert!(provider.create(&file, true).is_ok());
        // read-only grant cannot mint a read-write token
        assert!(matches!(provider.create(&file, false), Err(ProviderError::AccessDenied(_))));
    }

    #[test]
    fn test_create_missing_file() {
        let provider = GrantTableBookmarkProvider::new();
        let dir = tempdir().unwrap();
        provider.grant(dir.path(), false).unwrap();

        let missing = dir.path().join("missing.md");
        assert!(matches!(provider.create(&missing, true), Err(ProviderError::NotFound(_))));
    }

    #[test]
    fn test_fresh_token_resolves_not_stale() {
        let provider = GrantTableBookmarkProvider::new();
        let dir = tempdir().unwrap();
        let file = dir.path().join("doc.md");
        std::fs::write(&file, "# hi").unwrap();
        provider.grant(&file, true).unwrap();

        let token = provider.create(&file, true).unwrap();
        let resolved = provider.resolve(&token).unwrap();
        assert_eq!(resolved.path, file);
        assert!(!resolved.is_stale);
    }

    #[test]
    fn test_resolve_regrants_after_restart() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("doc.md");
        std::fs::write(&file, "# hi").unwrap();

        let first = GrantTableBookmarkProvider::new();
        first.grant(&file, true).unwrap();
        let token = first.create(&file, true).unwrap();

        let second = GrantTableBookmarkProvider::new();
        assert!(!second.begin_access(&file));
        second.resolve(&token).unwrap();
        assert!(second.begin_access(&file));
        second.end_access(&file);
    }

    #[test]
    fn test_old_token_version_is_stale() {
        let provider = GrantTableBookmarkProvider::new();
        let dir = tempdir().unwrap();
        let file = dir.path().join("doc.md");
        std::fs::write(&file, "# hi").unwrap();

        let token = GrantTableBookmarkProvider::encode_token(&TokenData {
            version: 1,
            path: file.clone(),
            canonical: normalize_path(&file).unwrap(),
            read_only: true,
            created_at: chrono::Utc::now(),
        })
        .unwrap();

        assert!(provider.resolve(&token).unwrap().is_stale);
    }

    #[test]
    fn test_garbage_token() {
        let provider = GrantTableBookmarkProvider::new();
        assert!(matches!(provider.resolve(b"not json"), Err(ProviderError::Failed(_))));
    }

    #[test]
    fn test_scope_counting() {
        let provider = GrantTableBookmarkProvider::new();
        let dir = tempdir().unwrap();
        provider.grant(dir.path(), true).unwrap();
        let file = dir.path().join("a.png");

        assert!(provider.begin_access(&file));
        assert!(provider.begin_access(&file));
        assert_eq!(provider.active_scopes(), 2);
        provider.end_access(&file);
        provider.end_access(&file);
        assert_eq!(provider.active_scopes(), 0);
    }

    #[test]
    fn test_begin_access_outside_grant() {
        let provider = GrantTableBookmarkProvider::new();
        let dir = tempdir().unwrap();
        assert!(!provider.begin_access(&dir.path().join("a.png")));
        assert_eq!(provider.active_scopes(), 0);
    }

    #[test]
    fn test_normalize_cleans_nonexistent_tail() {
        let dir = tempdir().unwrap();
        let base = dir.path().canonicalize().unwrap();
        let messy = dir.path().join("a/./b/../c.png");
        assert_eq!(normalize_path(&messy).unwrap(), base.join("a/c.png"));
    }
}
