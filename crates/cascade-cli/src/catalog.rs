//! Revision catalog loaded from JSON files.

use std::path::Path;

use anyhow::Context;
use cascade_core::revision::TransformationRevision;
use cascade_core::store::MemoryRevisionStore;
use serde::Deserialize;

use crate::TRACING_TARGET_CATALOG;

/// Contents of one catalog file.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Many(Vec<TransformationRevision>),
    One(Box<TransformationRevision>),
}

/// Loads every `*.json` file of `dir` into an in-memory store.
///
/// Files are read in name order; a later revision with the same id
/// replaces an earlier one.
pub async fn load_catalog(dir: &Path) -> anyhow::Result<MemoryRevisionStore> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to read catalog directory {}", dir.display()))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut store = MemoryRevisionStore::new();
    for path in paths {
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let revisions = match serde_json::from_slice(&bytes)
            .with_context(|| format!("invalid revision file {}", path.display()))?
        {
            CatalogFile::Many(revisions) => revisions,
            CatalogFile::One(revision) => vec![*revision],
        };

        tracing::debug!(
            target: TRACING_TARGET_CATALOG,
            path = %path.display(),
            revisions = revisions.len(),
            "Loaded catalog file"
        );
        revisions.into_iter().for_each(|revision| store.insert(revision));
    }

    tracing::info!(
        target: TRACING_TARGET_CATALOG,
        revisions = store.len(),
        "Catalog loaded"
    );
    Ok(store)
}
