//! Conflict check for pushing members of a class down into subclasses.

use serde::Serialize;

use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::models::MemberInfo;
use crate::refactor::{analyze_push_down_conflicts, TracingDiagnostics};
use crate::workspace::MEMBER_SEPARATOR;

use super::{conflict_views, load_model, resolve_address, ConflictView};

#[derive(Debug, Clone, Serialize)]
pub struct PushDownResult {
    pub class: String,
    pub members: Vec<String>,
    pub targets: Vec<String>,
    pub conflicts: Vec<ConflictView>,
    #[serde(rename = "c")]
    pub count: usize,
}

/// Analyse pushing `members` of `class` into `targets`. Read-only.
///
/// A member given as a bare name is looked up inside `class`.
pub fn check_push_down(
    db: &Database,
    config: &Config,
    class: &str,
    members: &[String],
    targets: &[String],
) -> Result<PushDownResult> {
    let ws = load_model(db)?;
    let class_id = resolve_address(&ws, class)?;
    let member_infos = members
        .iter()
        .map(|m| {
            let address = if m.contains(MEMBER_SEPARATOR) {
                m.clone()
            } else {
                format!("{class}.{m}")
            };
            resolve_address(&ws, &address).map(MemberInfo::new)
        })
        .collect::<Result<Vec<_>>>()?;
    let target_ids = targets
        .iter()
        .map(|t| resolve_address(&ws, t))
        .collect::<Result<Vec<_>>>()?;

    let catalog = config.catalog();
    let conflicts = analyze_push_down_conflicts(
        &ws,
        &catalog,
        &TracingDiagnostics,
        class_id,
        &member_infos,
        &target_ids,
    );
    let conflicts = conflict_views(&ws, &conflicts);

    Ok(PushDownResult {
        class: class.to_string(),
        members: members.to_vec(),
        targets: targets.to_vec(),
        count: conflicts.len(),
        conflicts,
    })
}
