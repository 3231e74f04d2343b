//! Incoming references of one element.

use serde::Serialize;

use crate::db::Database;
use crate::error::Result;
use crate::models::ProgramModel;

use super::{load_model, resolve_address};

/// Result of finding all references to an element.
#[derive(Debug, Clone, Serialize)]
pub struct RefsResult {
    /// The element address.
    #[serde(rename = "e")]
    pub element: String,
    #[serde(rename = "r")]
    pub refs: Vec<RefHit>,
    #[serde(rename = "c")]
    pub count: usize,
}

/// A single reference hit.
#[derive(Debug, Clone, Serialize)]
pub struct RefHit {
    /// File containing the reference.
    #[serde(rename = "f")]
    pub owner: String,
    /// `path` or `symbolic`.
    #[serde(rename = "k")]
    pub shape: String,
    /// Byte offset in the owner.
    #[serde(rename = "o")]
    pub start: usize,
    #[serde(rename = "t")]
    pub text: String,
}

pub fn get_refs(db: &Database, address: &str) -> Result<RefsResult> {
    let ws = load_model(db)?;
    let target = resolve_address(&ws, address)?;

    let refs: Vec<RefHit> = ws
        .references_to(target)
        .into_iter()
        .map(|r| RefHit {
            owner: ws.path_of(r.owner),
            shape: r.shape.as_str().to_string(),
            start: r.range.start,
            text: r.text,
        })
        .collect();
    let count = refs.len();

    Ok(RefsResult {
        element: address.to_string(),
        refs,
        count,
    })
}
