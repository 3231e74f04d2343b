use std::collections::{HashMap, HashSet};

use rusqlite::{params, Transaction};
use serde::Serialize;

use crate::error::{RestructureError, Result};
use crate::models::{
    Element, ElementId, ElementKind, ProgramModel, RefShape, Reference, ReferenceId, SyntaxNode,
    TextRange,
};
use crate::workspace::{hasher, Workspace, ROOT};

use super::Database;

impl Database {
    // ─── Whole-model operations ───

    /// Replace the stored model with `ws`. Runs in one transaction, so a
    /// failure leaves the previous model in place.
    pub fn save_workspace(&mut self, ws: &Workspace) -> Result<()> {
        let tx = self.begin_transaction()?;
        tx.execute_batch(
            "DELETE FROM bodies;\
             DELETE FROM refs;\
             DELETE FROM contents;\
             DELETE FROM elements;",
        )?;
        insert_elements(&tx, ws)?;
        insert_references(&tx, ws)?;
        tx.commit()?;
        tracing::debug!(
            elements = ws.element_count(),
            references = ws.reference_count(),
            "model saved"
        );
        Ok(())
    }

    /// Load the stored model, or `None` if nothing was imported yet.
    pub fn load_workspace(&self) -> Result<Option<Workspace>> {
        let elements = self.get_elements()?;
        if elements.is_empty() {
            return Ok(None);
        }
        let read_only: HashSet<ElementId> = self
            .get_read_only()?
            .into_iter()
            .collect();
        let contents: HashMap<ElementId, String> = self
            .get_contents()?
            .into_iter()
            .map(|(id, text, _)| (id, text))
            .collect();
        let bodies = self.get_bodies()?;
        let references = self.get_references()?;
        Workspace::from_parts(elements, contents, references, bodies, read_only).map(Some)
    }

    // ─── Element operations ───

    /// All elements in saved order (parents before children, siblings in order).
    pub fn get_elements(&self) -> Result<Vec<Element>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, parent_id, kind, name, version FROM elements ORDER BY seq",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;
        let mut elements = Vec::new();
        for r in rows {
            let (id, parent, kind, name, version) = r?;
            let kind = ElementKind::parse(&kind).ok_or_else(|| RestructureError::Snapshot {
                detail: format!("unknown element kind {kind:?} for element {id}"),
            })?;
            elements.push(Element {
                id: ElementId(id as u32),
                kind,
                name,
                parent: parent.map(|p| ElementId(p as u32)),
                version: version as u32,
            });
        }
        Ok(elements)
    }

    fn get_read_only(&self) -> Result<Vec<ElementId>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id FROM elements WHERE read_only = 1")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        let mut ids = Vec::new();
        for r in rows {
            ids.push(ElementId(r? as u32));
        }
        Ok(ids)
    }

    // ─── Content operations ───

    /// `(file, text, stored hash)` for every file.
    pub fn get_contents(&self) -> Result<Vec<(ElementId, String, String)>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT element_id, text, hash FROM contents ORDER BY element_id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                ElementId(row.get::<_, i64>(0)? as u32),
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut contents = Vec::new();
        for r in rows {
            contents.push(r?);
        }
        Ok(contents)
    }

    fn get_bodies(&self) -> Result<HashMap<ElementId, SyntaxNode>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT element_id, tree FROM bodies")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut bodies = HashMap::new();
        for r in rows {
            let (id, tree) = r?;
            bodies.insert(ElementId(id as u32), serde_json::from_str(&tree)?);
        }
        Ok(bodies)
    }

    // ─── Reference operations ───

    pub fn get_references(&self) -> Result<Vec<Reference>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, owner_id, target_id, shape, start_byte, end_byte, text
             FROM refs ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;
        let mut references = Vec::new();
        for r in rows {
            let (id, owner, target, shape, start, end, text) = r?;
            let shape = RefShape::parse(&shape).ok_or_else(|| RestructureError::Snapshot {
                detail: format!("unknown reference shape {shape:?} for reference {id}"),
            })?;
            references.push(Reference {
                id: ReferenceId(id as u32),
                owner: ElementId(owner as u32),
                target: ElementId(target as u32),
                shape,
                range: TextRange::new(start as usize, end as usize),
                text,
            });
        }
        Ok(references)
    }

    // ─── Statistics & integrity ───

    pub fn stats(&self) -> Result<ModelStats> {
        let count = |sql: &str| -> Result<u64> {
            let n: i64 = self.conn().query_row(sql, [], |r| r.get(0))?;
            Ok(n as u64)
        };
        Ok(ModelStats {
            directories: count("SELECT COUNT(*) FROM elements WHERE kind = 'dir'")?,
            files: count("SELECT COUNT(*) FROM contents")?,
            members: count("SELECT COUNT(*) FROM elements WHERE kind IN ('class', 'fn')")?,
            references: count("SELECT COUNT(*) FROM refs")?,
        })
    }

    /// Begin a transaction for batch operations.
    pub fn begin_transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn_mut().transaction()?)
    }

    /// Check stored hashes and reference ranges against the stored text.
    pub fn verify_integrity(&self) -> Result<IntegrityReport> {
        let mut report = IntegrityReport::default();
        let mut texts = HashMap::new();
        for (id, text, hash) in self.get_contents()? {
            if hasher::hash_text(&text) != hash {
                report.hash_mismatches.push(id);
            }
            texts.insert(id, text);
        }
        for reference in self.get_references()? {
            let found = texts
                .get(&reference.owner)
                .and_then(|t| t.get(reference.range.start..reference.range.end));
            if found != Some(reference.text.as_str()) {
                report.misplaced_refs.push(reference.id);
            }
        }
        Ok(report)
    }
}

fn insert_elements(tx: &Transaction<'_>, ws: &Workspace) -> Result<()> {
    let mut element_stmt = tx.prepare(
        "INSERT INTO elements (id, parent_id, seq, kind, name, read_only, version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    let mut content_stmt =
        tx.prepare("INSERT INTO contents (element_id, text, hash) VALUES (?1, ?2, ?3)")?;
    let mut body_stmt = tx.prepare("INSERT INTO bodies (element_id, tree) VALUES (?1, ?2)")?;

    let order = std::iter::once(ROOT).chain(ws.descendants(ROOT));
    for (seq, id) in order.enumerate() {
        let Some(element) = ws.element(id) else {
            continue;
        };
        element_stmt.execute(params![
            i64::from(element.id.0),
            element.parent.map(|p| i64::from(p.0)),
            seq as i64,
            element.kind.as_str(),
            element.name,
            ws.is_read_only(id),
            i64::from(element.version),
        ])?;
        if let Some(text) = ws.content(id) {
            content_stmt.execute(params![i64::from(id.0), text, hasher::hash_text(text)])?;
        }
        if let Some(body) = ws.body(id) {
            body_stmt.execute(params![i64::from(id.0), serde_json::to_string(body)?])?;
        }
    }
    Ok(())
}

fn insert_references(tx: &Transaction<'_>, ws: &Workspace) -> Result<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO refs (id, owner_id, target_id, shape, start_byte, end_byte, text)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for reference in ws.references() {
        stmt.execute(params![
            i64::from(reference.id.0),
            i64::from(reference.owner.0),
            i64::from(reference.target.0),
            reference.shape.as_str(),
            reference.range.start as i64,
            reference.range.end as i64,
            reference.text,
        ])?;
    }
    Ok(())
}

/// Row counts of the stored model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub directories: u64,
    pub files: u64,
    pub members: u64,
    pub references: u64,
}

/// Stored rows that disagree with each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// Files whose text no longer matches the stored hash.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hash_mismatches: Vec<ElementId>,
    /// References whose range does not hold their text.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub misplaced_refs: Vec<ReferenceId>,
}

impl IntegrityReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.hash_mismatches.is_empty() && self.misplaced_refs.is_empty()
    }
}
