//! Build the model from a JSON snapshot and store it.

use std::path::Path;

use serde::Serialize;

use crate::db::{Database, ModelStats};
use crate::error::Result;
use crate::workspace::Snapshot;

#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub source: String,
    #[serde(flatten)]
    pub stats: ModelStats,
}

/// Replace the stored model with the one described by `snapshot_path`.
pub fn import_snapshot(db: &mut Database, snapshot_path: &Path) -> Result<ImportResult> {
    let workspace = Snapshot::read(snapshot_path)?.build()?;
    db.save_workspace(&workspace)?;
    tracing::info!(source = %snapshot_path.display(), "model imported");
    Ok(ImportResult {
        source: snapshot_path.display().to_string(),
        stats: db.stats()?,
    })
}
