//! `quire recent` – the recent documents list.

use super::resolve::resolve_images;
use crate::cli::RecentCommand;
use anyhow::{Context, Result};
use quire_core::{
    DocumentMetadata, GrantTableBookmarkProvider, QuireConfig, RecentDocuments, Storage,
};
use std::sync::Arc;

pub async fn run_recent(cfg: &QuireConfig, command: RecentCommand) -> Result<()> {
    let storage = Storage::new_with_path(&cfg.data_dir)
        .with_context(|| format!("cannot open data directory {}", cfg.data_dir.display()))?;
    let provider = Arc::new(GrantTableBookmarkProvider::new());
    let recents = RecentDocuments::new(Arc::new(storage), provider.clone());

    match command {
        RecentCommand::Add { path } => {
            let path = path
                .canonicalize()
                .with_context(|| format!("cannot open document {}", path.display()))?;
            // Naming the file on the command line stands in for picking it
            provider.grant(&path, true)?;
            let record = recents.add(&path).await?;
            println!("{} {}", record.id, record.path.display());
        }
        RecentCommand::List { limit } => {
            let records = recents.list(limit)?;
            if records.is_empty() {
                println!("No recent documents.");
            } else {
                println!("{:<36} {:<20} {:<10} {}", "ID", "OPENED", "SIZE", "PATH");
                for r in records {
                    println!(
                        "{:<36} {:<20} {:<10} {}",
                        r.id,
                        r.last_opened_at.format("%Y-%m-%d %H:%M:%S"),
                        size(&r.metadata),
                        r.path.display()
                    );
                }
            }
        }
        RecentCommand::Open { id, images } => {
            let opened = match recents.open(&id).await {
                Ok(opened) => opened,
                Err(quire_core::Error::Bookmark(e)) => {
                    anyhow::bail!("{}. {}", e, e.recovery_suggestion())
                }
                Err(e) => return Err(e.into()),
            };
            println!(
                "{} ({} bytes, {} lines)",
                opened.record.path.display(),
                size(&opened.record.metadata),
                opened.text.lines().count()
            );
            if images {
                resolve_images(cfg, provider, &opened.record.path, &opened.text).await?;
            }
        }
        RecentCommand::Refresh { id } => {
            let metadata = recents.refresh_metadata(&id).await?;
            println!("{} bytes", size(&metadata));
        }
        RecentCommand::Remove { id } => {
            recents.remove(&id)?;
            println!("Removed {}", id);
        }
    }

    Ok(())
}

fn size(metadata: &DocumentMetadata) -> String {
    metadata
        .size
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string())
}
