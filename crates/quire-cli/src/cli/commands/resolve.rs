//! `quire resolve` – load every image a document references.

use anyhow::{Context, Result};
use futures::future::join_all;
use quire_core::{
    extract_image_references, BookmarkProvider, DirectorySidecarLocator, FileSystemHandler,
    GrantTableBookmarkProvider, HttpRemoteFetcher, ImageRequest, ImageSource, LoadImageUseCase,
    LoadResult, QuireConfig, ResolvedImage, SecureResourceLoader, SecurityScopedBookmarkStore,
    SidecarLocator,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn run_resolve(cfg: &QuireConfig, document: &Path, grants: &[PathBuf]) -> Result<()> {
    let document = document
        .canonicalize()
        .with_context(|| format!("cannot open document {}", document.display()))?;

    // Picking a document grants its folder, as an open panel would
    let provider = Arc::new(GrantTableBookmarkProvider::new());
    if let Some(dir) = document.parent() {
        provider.grant(dir, true)?;
    }
    for path in grants {
        provider.grant(path, true)?;
    }

    let store = SecurityScopedBookmarkStore::new(provider.clone());
    store.create_bookmark(&document)?;
    let text = store
        .with_access_async(|path| async move { FileSystemHandler::read_text_file(path).await })
        .await??;

    resolve_images(cfg, provider, &document, &text).await
}

/// Resolve all image references in `text` concurrently and print one line
/// per reference, in document order.
pub(super) async fn resolve_images(
    cfg: &QuireConfig,
    provider: Arc<dyn BookmarkProvider>,
    document: &Path,
    text: &str,
) -> Result<()> {
    let references = extract_image_references(text);
    if references.is_empty() {
        println!("No image references in {}.", document.display());
        return Ok(());
    }

    let loader = Arc::new(SecureResourceLoader::new(
        provider,
        Arc::new(HttpRemoteFetcher::with_config(&cfg.loader)?),
        cfg.loader.scope_policy.clone(),
    ));
    let use_case = LoadImageUseCase::new(Arc::clone(&loader));
    let locator = DirectorySidecarLocator::for_document(document, &cfg.sidecar.folder_suffix);

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let pending: Vec<_> = references
        .iter()
        .map(|reference| {
            let request = ImageRequest::new(&reference.raw_destination, &reference.alt_text)
                .with_document(document)
                .with_cancel(cancel.child_token());
            use_case.execute(request, locator.as_ref().map(|l| l as &dyn SidecarLocator))
        })
        .collect();

    let resolved = join_all(pending).await;
    interrupt.abort();

    println!("{:<10} {:<10} {:<24} {}", "STATUS", "SOURCE", "DETAIL", "TARGET");
    for image in &resolved {
        println!(
            "{:<10} {:<10} {:<24} {}",
            status(image),
            source_kind(&image.source),
            detail(image),
            target(&image.source)
        );
    }

    let stats = loader.stats();
    info!(
        "Resolved {} images: {} ok, {} missing, {} corrupt, {} unreachable, {} cancelled",
        resolved.len(),
        stats.succeeded,
        stats.missing,
        stats.corrupt,
        stats.unreachable,
        stats.cancelled
    );
    Ok(())
}

fn status(image: &ResolvedImage) -> String {
    match image.result.failure() {
        None => "ok".to_string(),
        Some(failure) => format!("{:?}", failure).to_lowercase(),
    }
}

fn source_kind(source: &ImageSource) -> &'static str {
    match source {
        ImageSource::Absolute { .. } => "absolute",
        ImageSource::DocumentRelative { .. } => "relative",
        ImageSource::Sidecar { .. } => "sidecar",
        ImageSource::Remote { .. } => "remote",
    }
}

fn detail(image: &ResolvedImage) -> String {
    match &image.result {
        LoadResult::Success(loaded) => {
            format!("{} {}x{}", loaded.mime_type(), loaded.width, loaded.height)
        }
        LoadResult::Failure(failure) => match failure.placeholder_kind() {
            Some(kind) => format!("{:?} placeholder", kind).to_lowercase(),
            None => "-".to_string(),
        },
    }
}

fn target(source: &ImageSource) -> String {
    if let Some(path) = source.local_path() {
        return path.display().to_string();
    }
    match source {
        ImageSource::Remote { url } => url.clone(),
        other => format!("{} (not in sidecar folder)", other.display_name()),
    }
}
