//! Recently opened documents
//!
//! Each record owns one bookmark token. Tokens live in SQLite; at runtime
//! every record gets its own [`SecurityScopedBookmarkStore`], so resolves and
//! repairs of one document are serialised while different documents proceed
//! independently.

use crate::error::{BookmarkError, Error, Result, StorageError};
use crate::sandbox::{BookmarkProvider, FileSystemHandler, ScopedAccess, SecurityScopedBookmarkStore};
use crate::storage::{self, Storage};
use crate::types::*;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of entries returned by [`RecentDocuments::list`]
pub const DEFAULT_RECENT_LIMIT: usize = 20;

/// A recent document opened under scoped access
#[derive(Debug, Clone)]
pub struct OpenedDocument {
    pub record: RecentDocumentRecord,
    pub text: String,
}

/// Recents list backed by storage and a bookmark provider
pub struct RecentDocuments {
    storage: Arc<Storage>,
    provider: Arc<dyn BookmarkProvider>,
    /// One bookmark store per record ID
    stores: Mutex<HashMap<String, Arc<SecurityScopedBookmarkStore>>>,
}

impl RecentDocuments {
    pub fn new(storage: Arc<Storage>, provider: Arc<dyn BookmarkProvider>) -> Self {
        Self {
            storage,
            provider,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Bookmark a document the user just picked and put it on the list.
    ///
    /// Adding a path that is already listed replaces its token and keeps its ID.
    pub async fn add(&self, path: impl AsRef<Path>) -> Result<RecentDocumentRecord> {
        let path = path.as_ref();
        let existing = {
            let conn = self.storage.connection()?;
            storage::get_recent_document_by_path(&conn, path)?
        };

        // A listed document keeps its store so an open in progress shares the writer
        let store = match &existing {
            Some(existing) => self.store_for(existing),
            None => Arc::new(SecurityScopedBookmarkStore::new(Arc::clone(&self.provider))),
        };
        let bookmark = store.create_bookmark(path)?;

        let mut record = RecentDocumentRecord::new(bookmark.path.clone(), bookmark.token);
        if let Some(existing) = existing {
            record.id = existing.id;
        }

        record.metadata = store
            .with_access_async(|p| async move { FileSystemHandler::get_metadata(p).await })
            .await?
            .unwrap_or_else(|e| {
                warn!("Could not read metadata for {:?}: {}", path, e);
                DocumentMetadata::default()
            });

        let conn = self.storage.connection()?;
        storage::upsert_recent_document(&conn, &record)?;
        self.stores.lock().entry(record.id.clone()).or_insert(store);

        info!("Added recent document: {} ({})", record.display_name, record.id);
        Ok(record)
    }

    /// List recent documents, most recently opened first
    pub fn list(&self, limit: usize) -> Result<Vec<RecentDocumentRecord>> {
        let conn = self.storage.connection()?;
        storage::list_recent_documents(&conn, limit)
    }

    /// Get a record by ID
    pub fn get(&self, id: &str) -> Result<RecentDocumentRecord> {
        let conn = self.storage.connection()?;
        storage::get_recent_document(&conn, id)?
            .ok_or_else(|| Error::Storage(StorageError::NotFound(id.to_string())))
    }

    /// Resolve the bookmark, read the document and refresh its cached
    /// metadata while access is held.
    ///
    /// A repaired token is written back before the document is read.
    pub async fn open(&self, id: &str) -> Result<OpenedDocument> {
        let mut record = self.get(id)?;
        let store = self.store_for(&record);
        let resolution = self.resolve(&store, &mut record)?;

        let (text, metadata) = {
            let _scope = ScopedAccess::acquire(store.provider(), &resolution).ok_or_else(|| {
                BookmarkError::AccessDenied(resolution.to_string_lossy().to_string())
            })?;
            let text = FileSystemHandler::read_text_file(&resolution).await?;
            let metadata = FileSystemHandler::get_metadata(&resolution).await;
            (text, metadata)
        };

        match metadata {
            Ok(metadata) => record.metadata = metadata,
            Err(e) => warn!("Keeping cached metadata for {:?}: {}", record.path, e),
        }
        record.last_opened_at = chrono::Utc::now();

        let conn = self.storage.connection()?;
        storage::update_recent_metadata(&conn, &record.id, &record.metadata, record.last_opened_at)?;

        debug!("Opened recent document {:?}", record.path);
        Ok(OpenedDocument { record, text })
    }

    /// Refresh cached size and modification date without touching the
    /// last-opened time
    pub async fn refresh_metadata(&self, id: &str) -> Result<DocumentMetadata> {
        let mut record = self.get(id)?;
        let store = self.store_for(&record);
        self.resolve(&store, &mut record)?;

        let metadata = store
            .with_access_async(|p| async move { FileSystemHandler::get_metadata(p).await })
            .await??;

        let conn = self.storage.connection()?;
        storage::update_recent_metadata(&conn, &record.id, &metadata, record.last_opened_at)?;
        Ok(metadata)
    }

    /// Remove a document from the list
    pub fn remove(&self, id: &str) -> Result<()> {
        let conn = self.storage.connection()?;
        storage::delete_recent_document(&conn, id)?;
        self.stores.lock().remove(id);
        info!("Removed recent document: {}", id);
        Ok(())
    }

    /// The bookmark store for a record, restored from its persisted token
    /// on first use
    pub fn store_for(&self, record: &RecentDocumentRecord) -> Arc<SecurityScopedBookmarkStore> {
        let mut stores = self.stores.lock();
        let store = stores.entry(record.id.clone()).or_insert_with(|| {
            Arc::new(SecurityScopedBookmarkStore::from_token(
                Arc::clone(&self.provider),
                record.bookmark.clone(),
                record.path.clone(),
            ))
        });
        Arc::clone(store)
    }

    /// Resolve through the store and persist a repaired token
    fn resolve(
        &self,
        store: &SecurityScopedBookmarkStore,
        record: &mut RecentDocumentRecord,
    ) -> Result<PathBuf> {
        let resolution = store.resolve_bookmark()?;

        if resolution.is_stale {
            if let Some(bookmark) = store.bookmark() {
                let conn = self.storage.connection()?;
                storage::update_recent_bookmark(&conn, &record.id, &bookmark.token)?;
                info!("Persisted repaired bookmark for {:?}", resolution.path);
                record.bookmark = bookmark.token;
            }
        }

        Ok(resolution.path)
    }
}
