//! Dry run of a relocation: discovered references and move conflicts.

use serde::Serialize;

use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::models::ProgramModel;
use crate::refactor::{RelocationProcessor, TracingDiagnostics};

use super::{conflict_views, load_model, resolve_address, ConflictView};

#[derive(Debug, Clone, Serialize)]
pub struct PlanResult {
    pub elements: Vec<String>,
    pub destination: String,
    pub refs: Vec<PlannedRef>,
    pub conflicts: Vec<ConflictView>,
}

/// A reference the move would rewrite.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedRef {
    #[serde(rename = "f")]
    pub owner: String,
    /// The element the reference points at.
    #[serde(rename = "to")]
    pub target: String,
    #[serde(rename = "k")]
    pub shape: String,
    #[serde(rename = "o")]
    pub start: usize,
    #[serde(rename = "t")]
    pub text: String,
}

pub fn plan_relocation(
    db: &Database,
    config: &Config,
    elements: &[String],
    destination: &str,
) -> Result<PlanResult> {
    let ws = load_model(db)?;
    let ids = elements
        .iter()
        .map(|a| resolve_address(&ws, a))
        .collect::<Result<Vec<_>>>()?;
    let dest = resolve_address(&ws, destination)?;

    let diagnostics = TracingDiagnostics;
    let mut processor = RelocationProcessor::new(&diagnostics)
        .with_options(config.relocation_options())
        .with_catalog(config.catalog());
    let plan = processor.plan_move(&ws, &ids, dest)?;
    let conflicts = processor.detect_move_conflicts(&ws, &plan);

    Ok(PlanResult {
        elements: elements.to_vec(),
        destination: destination.to_string(),
        refs: plan
            .references
            .iter()
            .map(|p| PlannedRef {
                owner: ws.path_of(p.reference.owner),
                target: ws.path_of(p.target),
                shape: p.reference.shape.as_str().to_string(),
                start: p.reference.range.start,
                text: p.reference.text.clone(),
            })
            .collect(),
        conflicts: conflict_views(&ws, &conflicts),
    })
}
