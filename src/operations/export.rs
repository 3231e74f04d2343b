//! Render the stored model back into a snapshot.

use crate::db::Database;
use crate::error::Result;
use crate::workspace::Snapshot;

use super::load_model;

pub fn export_snapshot(db: &Database) -> Result<Snapshot> {
    let ws = load_model(db)?;
    Ok(Snapshot::capture(&ws))
}
