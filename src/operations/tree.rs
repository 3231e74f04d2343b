//! Flat listing of the containment tree.

use serde::Serialize;

use crate::db::Database;
use crate::error::Result;
use crate::models::ProgramModel;
use crate::workspace::ROOT;

use super::load_model;

#[derive(Debug, Clone, Serialize)]
pub struct TreeEntry {
    #[serde(rename = "p")]
    pub path: String,
    #[serde(rename = "k")]
    pub kind: String,
    #[serde(rename = "d")]
    pub depth: usize,
    #[serde(rename = "ro", skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

/// Every element below the root in depth-first order.
pub fn build_tree(db: &Database) -> Result<Vec<TreeEntry>> {
    let ws = load_model(db)?;
    let mut entries = Vec::new();
    let mut stack: Vec<_> = ws.children(ROOT).into_iter().rev().map(|c| (c, 0)).collect();
    while let Some((id, depth)) = stack.pop() {
        let Some(element) = ws.element(id) else {
            continue;
        };
        entries.push(TreeEntry {
            path: ws.path_of(id),
            kind: element.kind.as_str().to_string(),
            depth,
            read_only: ws.is_read_only(id),
        });
        stack.extend(ws.children(id).into_iter().rev().map(|c| (c, depth + 1)));
    }
    Ok(entries)
}
