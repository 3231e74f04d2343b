//! The host program model seen by the refactoring core.
//!
//! Everything the core needs from the host is behind [`ProgramModel`]: the
//! containment tree with its move primitives, the reference index with its
//! rebind primitive, and name resolution for call expressions.

use crate::error::MoveError;

use super::element::{Element, ElementId, ElementKind};
use super::reference::{Reference, ReferenceId};
use super::syntax::{CallExpr, ResolveContext, SyntaxNode};

pub trait ProgramModel {
    fn element(&self, id: ElementId) -> Option<&Element>;

    /// Direct children in a stable order.
    fn children(&self, id: ElementId) -> Vec<ElementId>;

    /// Project-relative path (`a/b/Foo.txt`, `m/shapes.py::C.bar` for members).
    fn path_of(&self, id: ElementId) -> String;

    /// All references in the project whose target is `target`.
    fn references_to(&self, target: ElementId) -> Vec<Reference>;

    /// All references whose text lives in `owner`, by ascending offset.
    fn references_from(&self, owner: ElementId) -> Vec<Reference>;

    /// Current snapshot of a reference.
    fn reference(&self, id: ReferenceId) -> Option<Reference>;

    /// Element the reference's current text resolves to.
    fn resolve(&self, reference: &Reference) -> Option<ElementId>;

    /// Rewrite the text at `reference.range` so it points at `target`.
    ///
    /// Fails with a structural error when `target` cannot be spelled in the
    /// reference's shape, and with an invariant error when the snapshot no
    /// longer matches the owner's text. Returns the updated snapshot.
    fn rebind(&mut self, reference: &Reference, target: ElementId)
        -> Result<Reference, MoveError>;

    fn move_file(&mut self, file: ElementId, destination: ElementId) -> Result<(), MoveError>;

    fn move_directory(&mut self, dir: ElementId, destination: ElementId)
        -> Result<(), MoveError>;

    fn body(&self, function: ElementId) -> Option<&SyntaxNode>;

    fn resolve_callee(&self, call: &CallExpr, ctx: ResolveContext) -> Option<ElementId>;

    /// Name a symbolic reference spells for `id`, if it has one.
    fn symbol_name(&self, id: ElementId) -> Option<String>;

    /// Symbol name `id` would take once moved directly below `destination`.
    fn symbol_name_in(&self, id: ElementId, destination: ElementId) -> Option<String>;

    fn kind_of(&self, id: ElementId) -> Option<ElementKind> {
        self.element(id).map(|e| e.kind)
    }

    /// True if `id` is `ancestor` or lies anywhere below it.
    fn is_within(&self, id: ElementId, ancestor: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            current = self.element(cur).and_then(|e| e.parent);
        }
        false
    }

    /// Every element strictly below `id`, depth-first.
    fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = self.children(id);
        stack.reverse();
        while let Some(next) = stack.pop() {
            out.push(next);
            let mut kids = self.children(next);
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    /// Functions declared directly in `class`.
    fn methods(&self, class: ElementId) -> Vec<ElementId> {
        self.children(class)
            .into_iter()
            .filter(|&c| self.kind_of(c) == Some(ElementKind::Function))
            .collect()
    }

    /// Short human-readable description used in conflict messages.
    fn describe(&self, id: ElementId) -> String {
        let Some(element) = self.element(id) else {
            return format!("element {id}");
        };
        match element.kind {
            ElementKind::Function => {
                let in_class = element
                    .parent
                    .and_then(|p| self.kind_of(p))
                    .is_some_and(|k| k == ElementKind::Class);
                if in_class {
                    format!("method {}()", element.name)
                } else {
                    format!("function {}()", element.name)
                }
            }
            ElementKind::Class => format!("class {}", element.name),
            ElementKind::File(_) => format!("file {}", self.path_of(id)),
            ElementKind::Directory => format!("directory {}", self.path_of(id)),
        }
    }
}
