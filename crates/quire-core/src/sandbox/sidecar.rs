//! Sidecar image folder lookup
//!
//! A document `notes.md` keeps its pasted images in a flat folder next to it
//! (`notes.md.assets/` by default). References in the document name those
//! images by bare filename.

use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Default folder suffix appended to the document file name
pub const DEFAULT_SIDECAR_SUFFIX: &str = ".assets";

/// Looks up bare filenames in one per-document folder
pub trait SidecarLocator {
    /// Path of `name` inside the sidecar folder, if such a file exists
    fn exists(&self, name: &str) -> Option<PathBuf>;
}

/// Sidecar folder on the local filesystem
#[derive(Debug, Clone)]
pub struct DirectorySidecarLocator {
    dir: PathBuf,
}

impl DirectorySidecarLocator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Sidecar folder for `document`, named `<file name><suffix>`
    pub fn for_document(document: &Path, suffix: &str) -> Option<Self> {
        let parent = document.parent()?;
        let mut name = document.file_name()?.to_os_string();
        name.push(suffix);
        Some(Self::new(parent.join(name)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SidecarLocator for DirectorySidecarLocator {
    fn exists(&self, name: &str) -> Option<PathBuf> {
        // Exactly one plain component: no separators, no `.`/`..`, no root
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => {
                debug!("Rejected sidecar name {:?}", name);
                return None;
            }
        }

        let candidate = self.dir.join(name);
        if !candidate.is_file() {
            return None;
        }

        // A symlink inside the folder must not lead out of it
        let dir = self.dir.canonicalize().ok()?;
        let resolved = candidate.canonicalize().ok()?;
        if !resolved.starts_with(&dir) {
            warn!("Sidecar {:?} escapes {:?}", name, dir);
            return None;
        }

        Some(resolved)
    }
}
