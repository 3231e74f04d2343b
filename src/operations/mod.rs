//! Operations behind the CLI commands.
//!
//! Each operation loads what it needs from the model database and returns a
//! serializable result; `main.rs` only parses arguments and prints.

pub mod export;
pub mod import;
pub mod plan;
pub mod push_down;
pub mod refs;
pub mod relocate;
pub mod tree;
pub mod verify;

pub use export::export_snapshot;
pub use import::{import_snapshot, ImportResult};
pub use plan::{plan_relocation, PlanResult, PlannedRef};
pub use push_down::{check_push_down, PushDownResult};
pub use refs::{get_refs, RefHit, RefsResult};
pub use relocate::{relocate, MoveResult};
pub use tree::{build_tree, TreeEntry};
pub use verify::{verify_model, DanglingRef, VerifyResult};

use serde::Serialize;

use crate::db::Database;
use crate::error::{RestructureError, Result};
use crate::models::{ConflictRecord, ElementId, ProgramModel};
use crate::workspace::Workspace;

/// Load the imported model or fail with a hint to import first.
pub(crate) fn load_model(db: &Database) -> Result<Workspace> {
    db.load_workspace()?.ok_or(RestructureError::ModelNotFound)
}

pub(crate) fn resolve_address(ws: &Workspace, address: &str) -> Result<ElementId> {
    ws.find(address)
        .ok_or_else(|| RestructureError::ElementNotFound {
            address: address.to_string(),
        })
}

/// Conflicts of one element, addressed by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictView {
    #[serde(rename = "e")]
    pub element: String,
    #[serde(rename = "m")]
    pub messages: Vec<String>,
}

pub(crate) fn conflict_views(model: &dyn ProgramModel, conflicts: &ConflictRecord) -> Vec<ConflictView> {
    conflicts
        .iter()
        .map(|entry| ConflictView {
            element: model.path_of(entry.element),
            messages: entry.messages.clone(),
        })
        .collect()
}
