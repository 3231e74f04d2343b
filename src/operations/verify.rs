//! Consistency checks over the stored model.
//!
//! Reports stored rows that disagree with each other and references whose
//! text no longer resolves to the element they point at.

use serde::Serialize;

use crate::db::{Database, IntegrityReport};
use crate::error::Result;
use crate::models::ProgramModel;

use super::load_model;

#[derive(Debug, Clone, Serialize)]
pub struct VerifyResult {
    pub ok: bool,
    pub integrity: IntegrityReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dangling: Vec<DanglingRef>,
}

/// A reference whose text resolves somewhere else (or nowhere).
#[derive(Debug, Clone, Serialize)]
pub struct DanglingRef {
    #[serde(rename = "f")]
    pub owner: String,
    #[serde(rename = "o")]
    pub start: usize,
    #[serde(rename = "t")]
    pub text: String,
    /// Where the reference should point.
    pub target: String,
    /// Where its text points now.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolves_to: Option<String>,
}

pub fn verify_model(db: &Database) -> Result<VerifyResult> {
    let integrity = db.verify_integrity()?;
    let ws = load_model(db)?;

    let mut dangling = Vec::new();
    for reference in ws.references() {
        let resolved = ws.resolve(reference);
        if resolved != Some(reference.target) {
            dangling.push(DanglingRef {
                owner: ws.path_of(reference.owner),
                start: reference.range.start,
                text: reference.text.clone(),
                target: ws.path_of(reference.target),
                resolves_to: resolved.map(|id| ws.path_of(id)),
            });
        }
    }

    Ok(VerifyResult {
        ok: integrity.is_ok() && dangling.is_empty(),
        integrity,
        dangling,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RefShape;
    use crate::workspace::Workspace;

    #[test]
    fn fresh_model_verifies() {
        let mut db = Database::open_in_memory().unwrap();
        let mut ws = Workspace::new();
        let foo = ws.add_file_at("a/Foo.txt", "").unwrap();
        let bar = ws.add_file_at("b/Bar.txt", "../a/Foo.txt a.Foo").unwrap();
        ws.add_rendered_references(bar, foo, RefShape::Path).unwrap();
        ws.add_rendered_references(bar, foo, RefShape::Symbolic).unwrap();
        db.save_workspace(&ws).unwrap();

        let result = verify_model(&db).unwrap();
        assert!(result.ok);
        assert!(result.dangling.is_empty());
    }

    #[test]
    fn move_without_rebind_dangles() {
        let mut db = Database::open_in_memory().unwrap();
        let mut ws = Workspace::new();
        let foo = ws.add_file_at("a/Foo.txt", "").unwrap();
        let bar = ws.add_file_at("b/Bar.txt", "../a/Foo.txt").unwrap();
        ws.add_rendered_references(bar, foo, RefShape::Path).unwrap();
        let c = ws.ensure_directory("c").unwrap();
        ws.move_file(foo, c).unwrap();
        db.save_workspace(&ws).unwrap();

        let result = verify_model(&db).unwrap();
        assert!(!result.ok);
        assert_eq!(result.dangling.len(), 1);
        assert_eq!(result.dangling[0].target, "c/Foo.txt");
        assert_eq!(result.dangling[0].resolves_to, None);
    }
}
