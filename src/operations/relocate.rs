//! Apply a relocation to the stored model.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::Config;
use crate::db::Database;
use crate::error::{RestructureError, Result};
use crate::models::{ElementId, ProgramModel};
use crate::refactor::{
    MoveOutcome, MovedElement, NoticeSender, RelocationProcessor, TracingDiagnostics,
};
use crate::workspace::{hasher, Workspace};

use super::{conflict_views, load_model, resolve_address, ConflictView};

#[derive(Debug, Clone, Serialize)]
pub struct MoveResult {
    pub applied: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub moved: Vec<MovedPath>,
    pub rebound: usize,
    pub skipped: usize,
    pub hook_rewrites: usize,
    /// Files whose text changed, at their current path.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changed_files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<ConflictView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovedPath {
    pub from: String,
    pub to: String,
}

impl From<&MovedElement> for MovedPath {
    fn from(moved: &MovedElement) -> Self {
        Self {
            from: moved.old_path.clone(),
            to: moved.new_path.clone(),
        }
    }
}

/// Move `elements` into `destination` and store the result.
///
/// Conflicts reject the move unless `force` is set or the configuration
/// allows applying with conflicts. A rejected move returns a result with
/// `applied == false` and leaves the model untouched. When applying fails
/// part-way, the model is stored as it was left.
pub fn relocate(
    db: &mut Database,
    config: &Config,
    notices: NoticeSender,
    elements: &[String],
    destination: &str,
    force: bool,
) -> Result<MoveResult> {
    let mut ws = load_model(db)?;
    let ids = elements
        .iter()
        .map(|a| resolve_address(&ws, a))
        .collect::<Result<Vec<_>>>()?;
    let dest = resolve_address(&ws, destination)?;
    let before = file_hashes(&ws);
    let versions = element_versions(&ws);

    let diagnostics = TracingDiagnostics;
    let proceed_with_conflicts = force || !config.settings.conflicts.abort_on_conflicts;
    let mut processor = RelocationProcessor::new(&diagnostics)
        .with_options(config.relocation_options())
        .with_catalog(config.catalog())
        .with_notices(notices);

    let outcome = match processor.run(&mut ws, &ids, dest, |conflicts| {
        if proceed_with_conflicts {
            tracing::warn!(count = conflicts.len(), "applying move despite conflicts");
        }
        proceed_with_conflicts
    }) {
        Ok(outcome) => outcome,
        Err(err) => {
            // moves and rewrites that happened before the failure stay
            if element_versions(&ws) != versions {
                db.save_workspace(&ws)?;
            }
            return Err(RestructureError::Move(err));
        }
    };

    match outcome {
        MoveOutcome::Rejected(conflicts) => Ok(MoveResult {
            applied: false,
            moved: Vec::new(),
            rebound: 0,
            skipped: 0,
            hook_rewrites: 0,
            changed_files: Vec::new(),
            conflicts: conflict_views(&ws, &conflicts),
        }),
        MoveOutcome::Completed(report) => {
            db.save_workspace(&ws)?;
            let after = file_hashes(&ws);
            let mut changed_files: Vec<String> = after
                .iter()
                .filter(|(id, (_, hash))| before.get(*id).map(|(_, h)| h) != Some(hash))
                .map(|(_, (path, _))| path.clone())
                .collect();
            changed_files.sort();
            Ok(MoveResult {
                applied: true,
                moved: report.moved.iter().map(MovedPath::from).collect(),
                rebound: report.rebound,
                skipped: report.skipped,
                hook_rewrites: report.hook_rewrites,
                changed_files,
                conflicts: Vec::new(),
            })
        }
    }
}

/// `file -> (path, content hash)`.
fn file_hashes(ws: &Workspace) -> HashMap<ElementId, (String, String)> {
    ws.files()
        .map(|f| {
            (
                f.id,
                (
                    ws.path_of(f.id),
                    hasher::hash_text(ws.content(f.id).unwrap_or_default()),
                ),
            )
        })
        .collect()
}

/// Every move or text rewrite bumps the version of the element concerned.
fn element_versions(ws: &Workspace) -> HashMap<ElementId, u32> {
    ws.elements().map(|e| (e.id, e.version)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RefShape;
    use crate::refactor::notice_channel;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Config, Database) {
        let tmp = TempDir::new().unwrap();
        let config = Config::new(tmp.path());
        let mut db = Database::open_in_memory().unwrap();
        let mut ws = Workspace::new();
        let foo = ws.add_file_at("a/Foo.txt", "").unwrap();
        let bar = ws.add_file_at("b/Bar.txt", "see ../a/Foo.txt").unwrap();
        ws.add_file_at("c/Foo.txt", "").unwrap();
        let locked = ws.ensure_directory("locked").unwrap();
        ws.set_read_only(locked, true).unwrap();
        ws.ensure_directory("d").unwrap();
        ws.add_rendered_references(bar, foo, RefShape::Path).unwrap();
        db.save_workspace(&ws).unwrap();
        (tmp, config, db)
    }

    #[test]
    fn relocate_stores_rewritten_model() {
        let (_tmp, config, mut db) = setup();
        let (tx, mut rx) = notice_channel();
        let result = relocate(&mut db, &config, tx, &["a/Foo.txt".into()], "d", false).unwrap();

        assert!(result.applied);
        assert_eq!(result.moved[0].to, "d/Foo.txt");
        assert_eq!(result.changed_files, vec!["b/Bar.txt".to_string()]);
        assert!(rx.drain().is_empty());

        let ws = db.load_workspace().unwrap().unwrap();
        let bar = ws.find("b/Bar.txt").unwrap();
        assert_eq!(ws.content(bar), Some("see ../d/Foo.txt"));
    }

    #[test]
    fn conflicts_reject_unless_forced() {
        let (_tmp, config, mut db) = setup();
        let (tx, _rx) = notice_channel();
        let result = relocate(&mut db, &config, tx, &["a/Foo.txt".into()], "c", false).unwrap();
        assert!(!result.applied);
        assert_eq!(result.conflicts[0].element, "a/Foo.txt");
        let ws = db.load_workspace().unwrap().unwrap();
        assert!(ws.find("a/Foo.txt").is_some());
    }

    #[test]
    fn forced_clash_fails_with_notice() {
        let (_tmp, config, mut db) = setup();
        let (tx, mut rx) = notice_channel();
        let err = relocate(&mut db, &config, tx, &["a/Foo.txt".into()], "c", true).unwrap_err();
        assert!(matches!(err, RestructureError::Move(_)));
        let notices = rx.drain();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].message.contains("already exists"));
    }

    #[test]
    fn partial_move_of_empty_directory_is_stored() {
        let (_tmp, config, mut db) = setup();
        let mut ws = db.load_workspace().unwrap().unwrap();
        ws.ensure_directory("e").unwrap();
        let a = ws.find("a").unwrap();
        ws.set_read_only(a, true).unwrap();
        db.save_workspace(&ws).unwrap();

        let (tx, mut rx) = notice_channel();
        let err = relocate(&mut db, &config, tx, &["e".into(), "a/Foo.txt".into()], "d", false)
            .unwrap_err();
        assert!(err.to_string().contains("directory a is read-only"));
        assert_eq!(rx.drain().len(), 1);

        let ws = db.load_workspace().unwrap().unwrap();
        assert!(ws.find("d/e").is_some());
        assert!(ws.find("e").is_none());
        assert!(ws.find("a/Foo.txt").is_some());
    }

    #[test]
    fn failure_before_any_move_keeps_stored_model() {
        let (_tmp, config, mut db) = setup();
        let (tx, _rx) = notice_channel();
        assert!(relocate(&mut db, &config, tx, &["a/Foo.txt".into()], "locked", false).is_err());
        let ws = db.load_workspace().unwrap().unwrap();
        assert!(ws.find("a/Foo.txt").is_some());
    }

    #[test]
    fn read_only_destination_fails_with_notice() {
        let (_tmp, config, mut db) = setup();
        let (tx, mut rx) = notice_channel();
        assert!(relocate(&mut db, &config, tx, &["a/Foo.txt".into()], "locked", false).is_err());
        assert!(rx.drain()[0].message.contains("read-only"));
    }
}
