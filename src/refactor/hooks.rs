//! Per-file-kind hooks run around the physical move of a file.
//!
//! A file's own path-shaped links are relative to its location, so they go
//! stale when the file moves even though their targets stay put. The hooks
//! remember those links before the move and re-render them afterwards.

use std::collections::HashMap;

use crate::error::MoveError;
use crate::models::{ElementId, ElementKind, FileKind, ProgramModel, RefShape, ReferenceId};

pub trait MoveHook {
    /// Called before `file` is physically moved. Must not mutate the model.
    fn prepare_for_move(&mut self, model: &dyn ProgramModel, file: ElementId);

    /// Called once `file` is at its new location and external references are
    /// rebound. Returns how many references were re-rendered.
    fn finalize_move(
        &mut self,
        model: &mut dyn ProgramModel,
        file: ElementId,
    ) -> Result<usize, MoveError>;
}

/// Stashes a file's outgoing path-shaped references and rebinds each of them
/// to its unchanged target after the move.
#[derive(Debug, Default)]
pub struct PathContextHook {
    stash: HashMap<ElementId, Vec<ReferenceId>>,
}

impl PathContextHook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MoveHook for PathContextHook {
    fn prepare_for_move(&mut self, model: &dyn ProgramModel, file: ElementId) {
        let ids: Vec<ReferenceId> = model
            .references_from(file)
            .into_iter()
            .filter(|r| r.shape == RefShape::Path)
            .map(|r| r.id)
            .collect();
        if !ids.is_empty() {
            self.stash.insert(file, ids);
        }
    }

    fn finalize_move(
        &mut self,
        model: &mut dyn ProgramModel,
        file: ElementId,
    ) -> Result<usize, MoveError> {
        let Some(ids) = self.stash.remove(&file) else {
            return Ok(0);
        };
        let mut current = Vec::with_capacity(ids.len());
        for id in ids {
            let reference = model.reference(id).ok_or_else(|| {
                MoveError::invariant(format!(
                    "reference {} of {} disappeared during the move",
                    id.0,
                    model.path_of(file)
                ))
            })?;
            current.push(reference);
        }
        // offsets of earlier references stay valid while later ones change
        current.sort_by(|a, b| b.range.start.cmp(&a.range.start));
        for reference in &current {
            model.rebind(reference, reference.target)?;
        }
        Ok(current.len())
    }
}

/// Hooks keyed by file kind. Kinds without a hook are left alone.
#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<FileKind, Box<dyn MoveHook>>,
}

impl HookRegistry {
    /// An empty registry: files move without any hook.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Path-context hooks for every file kind.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for kind in [FileKind::Plain, FileKind::Markup, FileKind::Source] {
            registry.register(kind, Box::new(PathContextHook::new()));
        }
        registry
    }

    pub fn register(&mut self, kind: FileKind, hook: Box<dyn MoveHook>) {
        self.hooks.insert(kind, hook);
    }

    fn hook_for(&mut self, model: &dyn ProgramModel, file: ElementId) -> Option<&mut Box<dyn MoveHook>> {
        match model.kind_of(file)? {
            ElementKind::File(kind) => self.hooks.get_mut(&kind),
            _ => None,
        }
    }

    pub fn prepare(&mut self, model: &dyn ProgramModel, file: ElementId) {
        if let Some(hook) = self.hook_for(model, file) {
            hook.prepare_for_move(model, file);
        }
    }

    pub fn finalize(
        &mut self,
        model: &mut dyn ProgramModel,
        file: ElementId,
    ) -> Result<usize, MoveError> {
        match self.hook_for(&*model, file) {
            Some(hook) => hook.finalize_move(model, file),
            None => Ok(0),
        }
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.hooks.keys().collect();
        kinds.sort_by_key(|k| format!("{k:?}"));
        f.debug_struct("HookRegistry").field("kinds", &kinds).finish()
    }
}
