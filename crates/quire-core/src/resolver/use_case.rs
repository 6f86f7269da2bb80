//! Image loading entry point for renderers

use super::classifier::classify;
use super::loader::SecureResourceLoader;
use super::remote::{ProgressCallback, ProgressReporter};
use crate::sandbox::SidecarLocator;
use crate::types::ResolvedImage;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One image reference as encountered by the renderer
#[derive(Clone)]
pub struct ImageRequest {
    /// Destination exactly as written in the document
    pub raw: String,
    pub alt_text: String,
    pub document_location: Option<PathBuf>,
    pub on_progress: Option<ProgressCallback>,
    pub cancel: CancellationToken,
}

impl ImageRequest {
    pub fn new(raw: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            alt_text: alt_text.into(),
            document_location: None,
            on_progress: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_document(mut self, document: impl Into<PathBuf>) -> Self {
        self.document_location = Some(document.into());
        self
    }

    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl std::fmt::Debug for ImageRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageRequest")
            .field("raw", &self.raw)
            .field("alt_text", &self.alt_text)
            .field("document_location", &self.document_location)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Classify, then load
#[derive(Clone)]
pub struct LoadImageUseCase {
    loader: Arc<SecureResourceLoader>,
}

impl LoadImageUseCase {
    pub fn new(loader: Arc<SecureResourceLoader>) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &Arc<SecureResourceLoader> {
        &self.loader
    }

    /// Classification runs now, on the caller's thread, which owns the
    /// sidecar state. The returned future carries only the classified source
    /// and never calls back into `sidecar_lookup`.
    pub fn execute(
        &self,
        request: ImageRequest,
        sidecar_lookup: Option<&dyn SidecarLocator>,
    ) -> impl Future<Output = ResolvedImage> + Send + 'static {
        let source = classify(
            &request.raw,
            request.document_location.as_deref(),
            sidecar_lookup,
        );
        let loader = Arc::clone(&self.loader);

        async move {
            let ImageRequest {
                alt_text,
                document_location,
                on_progress,
                cancel,
                ..
            } = request;

            let result = loader
                .load(
                    &source,
                    document_location.as_deref(),
                    ProgressReporter::new(on_progress),
                    &cancel,
                )
                .await;

            ResolvedImage {
                source,
                alt_text,
                result,
            }
        }
    }
}
