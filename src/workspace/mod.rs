//! In-memory program model.
//!
//! `Workspace` is the concrete host model the CLI persists in
//! `.restructure/model.db`: a containment tree rooted at an unnamed directory,
//! UTF-8 file contents, a reference index kept consistent across rebinds, and
//! function bodies for conflict analysis.

pub mod hasher;
mod model;
pub mod paths;
pub mod snapshot;

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{RestructureError, Result};
use crate::models::{
    Element, ElementId, ElementKind, FileKind, RefShape, Reference, ReferenceId, SyntaxNode,
    TextRange,
};

pub use snapshot::Snapshot;

/// Identity of the project root directory.
pub const ROOT: ElementId = ElementId(0);

/// Separator between a file path and a member chain in element addresses.
pub const MEMBER_SEPARATOR: &str = "::";

#[derive(Debug, Clone)]
pub struct Workspace {
    elements: BTreeMap<ElementId, Element>,
    children: HashMap<ElementId, Vec<ElementId>>,
    contents: HashMap<ElementId, String>,
    references: BTreeMap<ReferenceId, Reference>,
    bodies: HashMap<ElementId, SyntaxNode>,
    read_only: HashSet<ElementId>,
    next_element: u32,
    next_reference: u32,
}

impl Workspace {
    /// An empty project containing only the root directory.
    #[must_use]
    pub fn new() -> Self {
        let mut elements = BTreeMap::new();
        elements.insert(
            ROOT,
            Element {
                id: ROOT,
                kind: ElementKind::Directory,
                name: String::new(),
                parent: None,
                version: 0,
            },
        );
        Self {
            elements,
            children: HashMap::new(),
            contents: HashMap::new(),
            references: BTreeMap::new(),
            bodies: HashMap::new(),
            read_only: HashSet::new(),
            next_element: 1,
            next_reference: 1,
        }
    }

    // ─── Construction ───

    pub fn add_directory(&mut self, parent: ElementId, name: &str) -> Result<ElementId> {
        self.expect_kind(parent, |k| k == ElementKind::Directory, "directory")?;
        self.insert_child(parent, ElementKind::Directory, name)
    }

    /// Create every missing directory along `path` and return the last one.
    pub fn ensure_directory(&mut self, path: &str) -> Result<ElementId> {
        let mut current = ROOT;
        for segment in paths::segments(path) {
            current = match self.child_named(current, segment) {
                Some(existing) => {
                    self.expect_kind(existing, |k| k == ElementKind::Directory, "directory")?;
                    existing
                }
                None => self.add_directory(current, segment)?,
            };
        }
        Ok(current)
    }

    pub fn add_file(&mut self, parent: ElementId, name: &str, content: &str) -> Result<ElementId> {
        self.expect_kind(parent, |k| k == ElementKind::Directory, "directory")?;
        let id = self.insert_child(parent, ElementKind::File(FileKind::from_name(name)), name)?;
        self.contents.insert(id, content.to_string());
        Ok(id)
    }

    /// Create a file at a project path, creating parent directories.
    pub fn add_file_at(&mut self, path: &str, content: &str) -> Result<ElementId> {
        let dir = self.ensure_directory(paths::parent(path))?;
        let name = paths::segments(path)
            .last()
            .copied()
            .ok_or_else(|| RestructureError::Snapshot {
                detail: format!("invalid file path: {path:?}"),
            })?;
        self.add_file(dir, name, content)
    }

    /// Add a class to a file or as a nested class.
    pub fn add_class(&mut self, parent: ElementId, name: &str) -> Result<ElementId> {
        self.expect_kind(
            parent,
            |k| k.is_file() || k == ElementKind::Class,
            "file or class",
        )?;
        self.insert_child(parent, ElementKind::Class, name)
    }

    pub fn add_function(
        &mut self,
        parent: ElementId,
        name: &str,
        body: SyntaxNode,
    ) -> Result<ElementId> {
        self.expect_kind(
            parent,
            |k| k.is_file() || k == ElementKind::Class,
            "file or class",
        )?;
        let id = self.insert_child(parent, ElementKind::Function, name)?;
        self.bodies.insert(id, body);
        Ok(id)
    }

    pub fn set_body(&mut self, function: ElementId, body: SyntaxNode) -> Result<()> {
        self.expect_kind(function, |k| k == ElementKind::Function, "function")?;
        self.bodies.insert(function, body);
        Ok(())
    }

    pub fn set_read_only(&mut self, dir: ElementId, read_only: bool) -> Result<()> {
        self.expect_kind(dir, |k| k == ElementKind::Directory, "directory")?;
        if read_only {
            self.read_only.insert(dir);
        } else {
            self.read_only.remove(&dir);
        }
        Ok(())
    }

    /// Register a reference whose rendered text starts at byte `start` of `owner`.
    pub fn add_reference(
        &mut self,
        owner: ElementId,
        target: ElementId,
        shape: RefShape,
        start: usize,
    ) -> Result<ReferenceId> {
        let text = self.render(owner, target, shape).ok_or_else(|| {
            RestructureError::Snapshot {
                detail: format!(
                    "{} cannot reference {} as a {} reference",
                    self.path_of_element(owner),
                    self.path_of_element(target),
                    shape.as_str()
                ),
            }
        })?;
        let content = self.contents.get(&owner).ok_or_else(|| RestructureError::Snapshot {
            detail: format!("{} has no text content", self.path_of_element(owner)),
        })?;
        let range = TextRange::new(start, start + text.len());
        if content.get(range.start..range.end) != Some(text.as_str()) {
            return Err(RestructureError::Snapshot {
                detail: format!(
                    "expected {text:?} at offset {start} of {}",
                    self.path_of_element(owner)
                ),
            });
        }
        if self.overlaps_existing(owner, range) {
            return Err(RestructureError::Snapshot {
                detail: format!(
                    "reference at offset {start} of {} overlaps another reference",
                    self.path_of_element(owner)
                ),
            });
        }
        Ok(self.insert_reference(owner, target, shape, range, text))
    }

    /// Register one reference per occurrence of the rendered text in `owner`.
    ///
    /// Occurrences overlapping an already registered reference are skipped.
    pub fn add_rendered_references(
        &mut self,
        owner: ElementId,
        target: ElementId,
        shape: RefShape,
    ) -> Result<Vec<ReferenceId>> {
        let text = self.render(owner, target, shape).ok_or_else(|| {
            RestructureError::Snapshot {
                detail: format!(
                    "{} cannot reference {} as a {} reference",
                    self.path_of_element(owner),
                    self.path_of_element(target),
                    shape.as_str()
                ),
            }
        })?;
        let starts: Vec<usize> = self
            .contents
            .get(&owner)
            .map(|c| c.match_indices(text.as_str()).map(|(i, _)| i).collect())
            .unwrap_or_default();

        let mut ids = Vec::new();
        for start in starts {
            let range = TextRange::new(start, start + text.len());
            if !self.overlaps_existing(owner, range) {
                ids.push(self.insert_reference(owner, target, shape, range, text.clone()));
            }
        }
        Ok(ids)
    }

    // ─── Lookup ───

    #[must_use]
    pub fn child_named(&self, parent: ElementId, name: &str) -> Option<ElementId> {
        self.children
            .get(&parent)?
            .iter()
            .copied()
            .find(|c| self.elements.get(c).is_some_and(|e| e.name == name))
    }

    /// Look up a file or directory by project path.
    #[must_use]
    pub fn find_by_path(&self, path: &str) -> Option<ElementId> {
        let mut current = ROOT;
        for segment in paths::segments(path) {
            current = self.child_named(current, segment)?;
        }
        Some(current)
    }

    /// Look up an element by address: `dir/file.ext` or `dir/file.ext::Class.member`.
    #[must_use]
    pub fn find(&self, address: &str) -> Option<ElementId> {
        match address.split_once(MEMBER_SEPARATOR) {
            Some((file, members)) => {
                let mut current = self.find_by_path(file)?;
                for name in members.split('.').filter(|s| !s.is_empty()) {
                    current = self.child_named(current, name)?;
                }
                Some(current)
            }
            None => self.find_by_path(address),
        }
    }

    #[must_use]
    pub fn content(&self, file: ElementId) -> Option<&str> {
        self.contents.get(&file).map(String::as_str)
    }

    #[must_use]
    pub fn is_read_only(&self, dir: ElementId) -> bool {
        self.read_only.contains(&dir)
    }

    /// Element count including the root.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.references.values()
    }

    pub fn files(&self) -> impl Iterator<Item = &Element> {
        self.elements.values().filter(|e| e.kind.is_file())
    }

    /// Dotted qualified name used by symbolic references.
    #[must_use]
    pub fn qualified_name(&self, id: ElementId) -> String {
        let Some(element) = self.elements.get(&id) else {
            return String::new();
        };
        match element.kind {
            ElementKind::Directory => paths::segments(&self.path_of_element(id)).join("."),
            ElementKind::File(_) => paths::module_name(&self.path_of_element(id)),
            ElementKind::Class | ElementKind::Function => {
                let parent = element.parent.map(|p| self.qualified_name(p)).unwrap_or_default();
                if parent.is_empty() {
                    element.name.clone()
                } else {
                    format!("{parent}.{}", element.name)
                }
            }
        }
    }

    /// Text a reference of `shape` inside `owner` must contain to point at `target`.
    ///
    /// `None` when the target cannot be spelled in that shape.
    #[must_use]
    pub fn render(&self, owner: ElementId, target: ElementId, shape: RefShape) -> Option<String> {
        if target == ROOT {
            return None;
        }
        let kind = self.elements.get(&target)?.kind;
        match shape {
            RefShape::Path => {
                if !kind.is_relocatable() {
                    return None;
                }
                let owner_dir = self.directory_of(owner)?;
                Some(paths::relative_path(
                    &self.path_of_element(owner_dir),
                    &self.path_of_element(target),
                ))
            }
            RefShape::Symbolic => Some(self.qualified_name(target)),
        }
    }

    /// Nearest enclosing directory of an element (itself for directories).
    #[must_use]
    pub fn directory_of(&self, id: ElementId) -> Option<ElementId> {
        let mut current = Some(id);
        while let Some(cur) = current {
            let element = self.elements.get(&cur)?;
            if element.kind == ElementKind::Directory {
                return Some(cur);
            }
            current = element.parent;
        }
        None
    }

    pub(crate) fn path_of_element(&self, id: ElementId) -> String {
        let mut path_parts: Vec<&str> = Vec::new();
        let mut member_parts: Vec<&str> = Vec::new();
        let mut current = self.elements.get(&id);
        while let Some(element) = current {
            match element.kind {
                ElementKind::Class | ElementKind::Function => member_parts.push(&element.name),
                _ if element.id != ROOT => path_parts.push(&element.name),
                _ => {}
            }
            current = element.parent.and_then(|p| self.elements.get(&p));
        }
        path_parts.reverse();
        member_parts.reverse();
        let path = path_parts.join("/");
        if member_parts.is_empty() {
            path
        } else {
            format!("{path}{MEMBER_SEPARATOR}{}", member_parts.join("."))
        }
    }

    // ─── Persistence support ───

    pub(crate) fn body_of(&self, function: ElementId) -> Option<&SyntaxNode> {
        self.bodies.get(&function)
    }

    pub(crate) fn bodies(&self) -> impl Iterator<Item = (&ElementId, &SyntaxNode)> {
        self.bodies.iter()
    }

    /// Rebuild a workspace from persisted rows. Elements must include the root.
    pub(crate) fn from_parts(
        elements: Vec<Element>,
        contents: HashMap<ElementId, String>,
        references: Vec<Reference>,
        bodies: HashMap<ElementId, SyntaxNode>,
        read_only: HashSet<ElementId>,
    ) -> Result<Self> {
        let mut ws = Self::new();
        ws.elements.clear();
        let mut max_element = 0;
        for element in elements {
            max_element = max_element.max(element.id.0);
            if let Some(parent) = element.parent {
                ws.children.entry(parent).or_default().push(element.id);
            }
            ws.elements.insert(element.id, element);
        }
        if !ws.elements.contains_key(&ROOT) {
            return Err(RestructureError::Snapshot {
                detail: "persisted model has no root directory".into(),
            });
        }
        let mut max_reference = 0;
        for reference in references {
            max_reference = max_reference.max(reference.id.0);
            ws.references.insert(reference.id, reference);
        }
        ws.contents = contents;
        ws.bodies = bodies;
        ws.read_only = read_only;
        ws.next_element = max_element + 1;
        ws.next_reference = max_reference + 1;
        Ok(ws)
    }

    // ─── Internals ───

    fn expect_kind(
        &self,
        id: ElementId,
        accept: impl Fn(ElementKind) -> bool,
        expected: &str,
    ) -> Result<()> {
        match self.elements.get(&id) {
            Some(e) if accept(e.kind) => Ok(()),
            Some(_) => Err(RestructureError::Snapshot {
                detail: format!("{} is not a {expected}", self.path_of_element(id)),
            }),
            None => Err(RestructureError::ElementNotFound {
                address: id.to_string(),
            }),
        }
    }

    fn insert_child(&mut self, parent: ElementId, kind: ElementKind, name: &str) -> Result<ElementId> {
        if name.is_empty() || name.contains('/') || name.contains(MEMBER_SEPARATOR) {
            return Err(RestructureError::Snapshot {
                detail: format!("invalid element name: {name:?}"),
            });
        }
        if self.child_named(parent, name).is_some() {
            return Err(RestructureError::Snapshot {
                detail: format!(
                    "{} already contains {name}",
                    self.path_of_element(parent)
                ),
            });
        }
        let id = ElementId(self.next_element);
        self.next_element += 1;
        self.elements.insert(
            id,
            Element {
                id,
                kind,
                name: name.to_string(),
                parent: Some(parent),
                version: 0,
            },
        );
        self.children.entry(parent).or_default().push(id);
        Ok(id)
    }

    fn insert_reference(
        &mut self,
        owner: ElementId,
        target: ElementId,
        shape: RefShape,
        range: TextRange,
        text: String,
    ) -> ReferenceId {
        let id = ReferenceId(self.next_reference);
        self.next_reference += 1;
        self.references.insert(
            id,
            Reference {
                id,
                owner,
                target,
                shape,
                range,
                text,
            },
        );
        id
    }

    fn overlaps_existing(&self, owner: ElementId, range: TextRange) -> bool {
        self.references
            .values()
            .filter(|r| r.owner == owner)
            .any(|r| r.range.start < range.end && range.start < r.range.end)
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> (Workspace, ElementId, ElementId) {
        let mut ws = Workspace::new();
        let foo = ws.add_file_at("a/Foo.txt", "foo").unwrap();
        let bar = ws.add_file_at("b/Bar.txt", "see ../a/Foo.txt").unwrap();
        ws.ensure_directory("c").unwrap();
        (ws, foo, bar)
    }

    #[test]
    fn paths_and_lookup() {
        let (ws, foo, _) = docs();
        assert_eq!(ws.path_of_element(foo), "a/Foo.txt");
        assert_eq!(ws.find("a/Foo.txt"), Some(foo));
        assert_eq!(ws.find("a/Missing.txt"), None);
        assert_eq!(ws.find_by_path(""), Some(ROOT));
    }

    #[test]
    fn member_addresses() {
        let mut ws = Workspace::new();
        let file = ws.add_file_at("m/shapes.py", "").unwrap();
        let class = ws.add_class(file, "C").unwrap();
        let method = ws.add_function(class, "bar", SyntaxNode::block(vec![])).unwrap();
        assert_eq!(ws.path_of_element(method), "m/shapes.py::C.bar");
        assert_eq!(ws.find("m/shapes.py::C.bar"), Some(method));
        assert_eq!(ws.qualified_name(method), "m.shapes.C.bar");
    }

    #[test]
    fn duplicate_sibling_rejected() {
        let (mut ws, _, _) = docs();
        let a = ws.find("a").unwrap();
        assert!(ws.add_file(a, "Foo.txt", "").is_err());
    }

    #[test]
    fn render_path_and_symbolic() {
        let (ws, foo, bar) = docs();
        assert_eq!(ws.render(bar, foo, RefShape::Path).as_deref(), Some("../a/Foo.txt"));
        assert_eq!(ws.render(bar, foo, RefShape::Symbolic).as_deref(), Some("a.Foo"));
        assert_eq!(ws.render(bar, ROOT, RefShape::Path), None);
    }

    #[test]
    fn add_reference_checks_text() {
        let (mut ws, foo, bar) = docs();
        assert!(ws.add_reference(bar, foo, RefShape::Path, 0).is_err());
        let id = ws.add_reference(bar, foo, RefShape::Path, 4).unwrap();
        assert_eq!(ws.references[&id].range, TextRange::new(4, 16));
        // same range again overlaps
        assert!(ws.add_reference(bar, foo, RefShape::Path, 4).is_err());
    }

    #[test]
    fn rendered_references_find_every_occurrence() {
        let mut ws = Workspace::new();
        let foo = ws.add_file_at("a/Foo.txt", "").unwrap();
        let bar = ws
            .add_file_at("b/Bar.txt", "[1](../a/Foo.txt) and [2](../a/Foo.txt)")
            .unwrap();
        let ids = ws.add_rendered_references(bar, foo, RefShape::Path).unwrap();
        assert_eq!(ids.len(), 2);
        // already registered occurrences are skipped
        assert!(ws.add_rendered_references(bar, foo, RefShape::Path).unwrap().is_empty());
    }

    #[test]
    fn directory_of_members() {
        let mut ws = Workspace::new();
        let file = ws.add_file_at("pkg/mod.py", "").unwrap();
        let class = ws.add_class(file, "K").unwrap();
        let pkg = ws.find("pkg").unwrap();
        assert_eq!(ws.directory_of(class), Some(pkg));
        assert_eq!(ws.directory_of(pkg), Some(pkg));
    }
}
