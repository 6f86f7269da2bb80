//! Image reference and load result types

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where an image reference points, after classification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    /// Absolute filesystem path
    Absolute { path: PathBuf },
    /// `./` or `../` reference joined against the document's directory
    DocumentRelative { path: PathBuf },
    /// Bare filename looked up in the document's sidecar folder
    Sidecar {
        name: String,
        resolved: Option<PathBuf>,
    },
    /// `http://` or `https://` URL
    Remote { url: String },
}

impl ImageSource {
    /// Only user-visible filesystem paths go through scoped access.
    /// Sidecar folders are app-owned and remote sources never touch disk.
    pub fn requires_security_scope(&self) -> bool {
        match self {
            Self::Absolute { .. } | Self::DocumentRelative { .. } => true,
            Self::Sidecar { .. } | Self::Remote { .. } => false,
        }
    }

    /// Local path this source reads from, if any
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Self::Absolute { path } | Self::DocumentRelative { path } => Some(path),
            Self::Sidecar { resolved, .. } => resolved.as_deref(),
            Self::Remote { .. } => None,
        }
    }

    /// File name used when labelling placeholders
    pub fn display_name(&self) -> String {
        match self {
            Self::Absolute { path } | Self::DocumentRelative { path } => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.to_string_lossy().to_string()),
            Self::Sidecar { name, .. } => name.clone(),
            Self::Remote { url } => url
                .rsplit('/')
                .find(|segment| !segment.is_empty())
                .unwrap_or(url)
                .to_string(),
        }
    }
}

/// Decoded-header view of a successfully loaded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    pub bytes: Vec<u8>,
    pub format: image::ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl LoadedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Why an image could not be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadFailure {
    /// Nothing at the referenced location, or it could not be opened
    Missing,
    /// Bytes were read but are not a decodable image
    Corrupt,
    /// Remote host could not be reached or returned an error
    Unreachable,
    /// The caller cancelled the load
    Cancelled,
}

impl LoadFailure {
    /// Placeholder to show for this failure. Cancelled loads show nothing.
    pub fn placeholder_kind(&self) -> Option<PlaceholderKind> {
        match self {
            Self::Missing | Self::Unreachable => Some(PlaceholderKind::Missing),
            Self::Corrupt => Some(PlaceholderKind::Corrupt),
            Self::Cancelled => None,
        }
    }
}

/// Outcome of a single load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadResult {
    Success(LoadedImage),
    Failure(LoadFailure),
}

impl LoadResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn failure(&self) -> Option<LoadFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(reason) => Some(*reason),
        }
    }

    pub fn image(&self) -> Option<&LoadedImage> {
        match self {
            Self::Success(image) => Some(image),
            Self::Failure(_) => None,
        }
    }
}

impl From<LoadFailure> for LoadResult {
    fn from(reason: LoadFailure) -> Self {
        Self::Failure(reason)
    }
}

/// Fallback image categories a renderer can draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderKind {
    Missing,
    Corrupt,
    Loading,
}

/// Implemented by the view layer to draw fallback images
pub trait PlaceholderProvider {
    type Image;

    fn placeholder(&self, kind: PlaceholderKind, alt_text: &str, file_name: &str) -> Self::Image;
}

/// One image reference after classification and load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub source: ImageSource,
    pub alt_text: String,
    pub result: LoadResult,
}

impl ResolvedImage {
    /// Render either the image or the placeholder for its failure.
    /// Returns `None` for cancelled loads.
    pub fn render_with<P: PlaceholderProvider>(
        &self,
        placeholders: &P,
        decode: impl FnOnce(&LoadedImage) -> P::Image,
    ) -> Option<P::Image> {
        match &self.result {
            LoadResult::Success(image) => Some(decode(image)),
            LoadResult::Failure(reason) => reason.placeholder_kind().map(|kind| {
                placeholders.placeholder(kind, &self.alt_text, &self.source.display_name())
            }),
        }
    }
}
