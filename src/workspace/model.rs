use std::io;

use crate::error::MoveError;
use crate::models::{
    CallExpr, Callee, Element, ElementId, ElementKind, ProgramModel, RefShape, Reference,
    ReferenceId, ResolveContext, SyntaxNode,
};

use super::{paths, Workspace, ROOT};

impl ProgramModel for Workspace {
    fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.children.get(&id).cloned().unwrap_or_default()
    }

    fn path_of(&self, id: ElementId) -> String {
        self.path_of_element(id)
    }

    fn references_to(&self, target: ElementId) -> Vec<Reference> {
        self.references
            .values()
            .filter(|r| r.target == target)
            .cloned()
            .collect()
    }

    fn references_from(&self, owner: ElementId) -> Vec<Reference> {
        let mut refs: Vec<Reference> = self
            .references
            .values()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect();
        refs.sort_by_key(|r| r.range.start);
        refs
    }

    fn reference(&self, id: ReferenceId) -> Option<Reference> {
        self.references.get(&id).cloned()
    }

    fn resolve(&self, reference: &Reference) -> Option<ElementId> {
        match reference.shape {
            RefShape::Path => {
                let dir = self.directory_of(reference.owner)?;
                let path = paths::join(&self.path_of_element(dir), &reference.text)?;
                self.find_by_path(&path).filter(|&id| id != ROOT)
            }
            RefShape::Symbolic => self
                .elements
                .keys()
                .copied()
                .filter(|&id| id != ROOT)
                .find(|&id| self.qualified_name(id) == reference.text),
        }
    }

    fn rebind(&mut self, snapshot: &Reference, target: ElementId) -> Result<Reference, MoveError> {
        let stored = self
            .references
            .get(&snapshot.id)
            .ok_or_else(|| MoveError::invariant(format!("unknown reference {}", snapshot.id.0)))?;
        if stored.owner != snapshot.owner || stored.range != snapshot.range {
            return Err(MoveError::invariant(format!(
                "stale reference {} in {}: recorded at {}..{}, now at {}..{}",
                snapshot.id.0,
                self.path_of_element(snapshot.owner),
                snapshot.range.start,
                snapshot.range.end,
                stored.range.start,
                stored.range.end
            )));
        }

        let owner = snapshot.owner;
        let range = snapshot.range;
        let current = self
            .contents
            .get(&owner)
            .and_then(|c| c.get(range.start..range.end));
        if current != Some(snapshot.text.as_str()) {
            return Err(MoveError::invariant(format!(
                "stale reference {} in {}: expected {:?} at {}..{}",
                snapshot.id.0,
                self.path_of_element(owner),
                snapshot.text,
                range.start,
                range.end
            )));
        }

        let new_text =
            self.render(owner, target, snapshot.shape)
                .ok_or_else(|| MoveError::StructuralIo {
                    element: self.path_of_element(owner),
                    detail: format!(
                        "{} cannot be spelled as a {} reference",
                        self.path_of_element(target),
                        snapshot.shape.as_str()
                    ),
                    cause: None,
                })?;

        let rendered = Reference {
            text: new_text.clone(),
            ..snapshot.clone()
        };
        let resolved = self.resolve(&rendered);
        if resolved != Some(target) {
            let found = resolved.map_or_else(|| "nothing".to_string(), |id| self.path_of_element(id));
            return Err(MoveError::StructuralIo {
                element: self.path_of_element(owner),
                detail: format!(
                    "{new_text} would name {found} instead of {}",
                    self.path_of_element(target)
                ),
                cause: None,
            });
        }

        if let Some(content) = self.contents.get_mut(&owner) {
            content.replace_range(range.start..range.end, &new_text);
        }

        let new_end = range.start + new_text.len();
        for other in self.references.values_mut() {
            if other.owner == owner && other.id != snapshot.id && other.range.start >= range.end {
                other.range.start = other.range.start - range.end + new_end;
                other.range.end = other.range.end - range.end + new_end;
            }
        }

        let updated = self
            .references
            .get_mut(&snapshot.id)
            .ok_or_else(|| MoveError::invariant("reference vanished during rebind"))?;
        updated.target = target;
        updated.range.end = new_end;
        updated.text = new_text;
        let updated = updated.clone();

        if let Some(element) = self.elements.get_mut(&owner) {
            element.version += 1;
        }
        Ok(updated)
    }

    fn move_file(&mut self, file: ElementId, destination: ElementId) -> Result<(), MoveError> {
        match self.elements.get(&file).map(|e| e.kind) {
            Some(kind) if kind.is_file() => self.relocate(file, destination),
            Some(_) => Err(MoveError::invariant(format!(
                "{} is not a file",
                self.path_of_element(file)
            ))),
            None => Err(MoveError::invariant(format!("unknown element {file}"))),
        }
    }

    fn move_directory(&mut self, dir: ElementId, destination: ElementId) -> Result<(), MoveError> {
        if dir == ROOT {
            return Err(MoveError::invariant("the project root cannot be moved"));
        }
        match self.elements.get(&dir).map(|e| e.kind) {
            Some(ElementKind::Directory) => {}
            Some(_) => {
                return Err(MoveError::invariant(format!(
                    "{} is not a directory",
                    self.path_of_element(dir)
                )))
            }
            None => return Err(MoveError::invariant(format!("unknown element {dir}"))),
        }
        if self.is_within(destination, dir) {
            return Err(MoveError::structural(
                self.path_of_element(dir),
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "cannot move {} into itself",
                        self.path_of_element(dir)
                    ),
                ),
            ));
        }
        self.relocate(dir, destination)
    }

    fn body(&self, function: ElementId) -> Option<&SyntaxNode> {
        self.body_of(function)
    }

    fn resolve_callee(&self, call: &CallExpr, ctx: ResolveContext) -> Option<ElementId> {
        let id = match &call.callee {
            Callee::Direct(id) => *id,
            Callee::Implicit(id) if ctx.allow_implicits => *id,
            Callee::Implicit(_) | Callee::Unresolved(_) => return None,
        };
        match self.elements.get(&id)?.kind {
            ElementKind::Function | ElementKind::Class => Some(id),
            _ => None,
        }
    }

    fn symbol_name(&self, id: ElementId) -> Option<String> {
        if id == ROOT || !self.elements.contains_key(&id) {
            return None;
        }
        Some(self.qualified_name(id))
    }

    fn symbol_name_in(&self, id: ElementId, destination: ElementId) -> Option<String> {
        let element = self.elements.get(&id)?;
        let leaf = match element.kind {
            ElementKind::File(_) => paths::module_name(&element.name),
            _ => element.name.clone(),
        };
        let parent = self.qualified_name(destination);
        if parent.is_empty() {
            Some(leaf)
        } else {
            Some(format!("{parent}.{leaf}"))
        }
    }
}

impl Workspace {
    /// Reparent a file or directory under `destination`.
    fn relocate(&mut self, id: ElementId, destination: ElementId) -> Result<(), MoveError> {
        let element_path = self.path_of_element(id);
        match self.elements.get(&destination).map(|e| e.kind) {
            Some(ElementKind::Directory) => {}
            _ => {
                return Err(MoveError::invariant(format!(
                    "destination {destination} is not a directory"
                )))
            }
        }
        let (name, old_parent) = match self.elements.get(&id) {
            Some(e) => (e.name.clone(), e.parent.unwrap_or(ROOT)),
            None => return Err(MoveError::invariant(format!("unknown element {id}"))),
        };
        if old_parent == destination {
            return Ok(());
        }

        for dir in [old_parent, destination] {
            if self.is_read_only(dir) {
                return Err(MoveError::structural(
                    element_path,
                    io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        format!("directory {} is read-only", self.display_dir(dir)),
                    ),
                ));
            }
        }
        if self.child_named(destination, &name).is_some() {
            let clash = paths::join(&self.path_of_element(destination), &name).unwrap_or(name);
            return Err(MoveError::structural(
                element_path,
                io::Error::new(io::ErrorKind::AlreadyExists, format!("{clash} already exists")),
            ));
        }

        if let Some(siblings) = self.children.get_mut(&old_parent) {
            siblings.retain(|&c| c != id);
        }
        self.children.entry(destination).or_default().push(id);
        if let Some(element) = self.elements.get_mut(&id) {
            element.parent = Some(destination);
            element.version += 1;
        }
        Ok(())
    }

    fn display_dir(&self, dir: ElementId) -> String {
        if dir == ROOT {
            "/".to_string()
        } else {
            self.path_of_element(dir)
        }
    }
}
