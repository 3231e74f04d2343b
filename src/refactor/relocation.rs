//! Moving files and directories with reference rewriting.
//!
//! A relocation runs in phases: discover references (`plan_move`), look for
//! conflicts the caller may veto (`detect_move_conflicts`), then apply. Apply
//! moves every element, rebinds the discovered references and lets the
//! per-file-kind hooks fix up each moved file's own relative links.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::MoveError;
use crate::models::{
    ConflictRecord, ElementHandle, ElementId, ElementKind, ProgramModel, RefShape,
};

use super::diagnostics::{Diagnostics, Notice, NoticeSender};
use super::hooks::HookRegistry;
use super::messages::{self, MessageCatalog};
use super::query::{find_references, PendingReference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveState {
    Idle,
    Collecting,
    ConflictCheck,
    Applying,
    Rebinding,
    Finalizing,
    Completed,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelocationOptions {
    /// Also rewrite references to elements below a moved element.
    pub follow_descendants: bool,
    /// Move already relocated elements back when a later physical move fails.
    pub rollback_on_failure: bool,
}

impl Default for RelocationOptions {
    fn default() -> Self {
        Self {
            follow_descendants: true,
            rollback_on_failure: false,
        }
    }
}

/// Everything needed to apply a relocation, captured before any mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovePlan {
    pub elements: Vec<ElementHandle>,
    pub destination: ElementHandle,
    pub references: Vec<PendingReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovedElement {
    pub element: ElementId,
    pub old_path: String,
    pub new_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MoveReport {
    pub moved: Vec<MovedElement>,
    /// Discovered references rewritten to their target's new location.
    pub rebound: usize,
    /// Path-shaped self references left to the file hooks.
    pub skipped: usize,
    /// Links inside moved files re-rendered by the hooks.
    pub hook_rewrites: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Completed(MoveReport),
    /// The conflict check found problems and the caller declined to proceed.
    Rejected(ConflictRecord),
}

/// Told about each element right after it moved.
pub trait MoveListener {
    fn element_moved(&mut self, element: ElementId);
}

/// Records moved elements in order.
#[derive(Debug, Default)]
pub struct MoveJournal {
    pub moved: Vec<ElementId>,
}

impl MoveListener for MoveJournal {
    fn element_moved(&mut self, element: ElementId) {
        self.moved.push(element);
    }
}

pub struct RelocationProcessor<'a> {
    options: RelocationOptions,
    catalog: MessageCatalog,
    diagnostics: &'a dyn Diagnostics,
    notices: Option<NoticeSender>,
    hooks: HookRegistry,
    listener: Option<&'a mut dyn MoveListener>,
    on_completed: Option<Box<dyn FnOnce() + 'a>>,
    state: MoveState,
}

impl<'a> RelocationProcessor<'a> {
    #[must_use]
    pub fn new(diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            options: RelocationOptions::default(),
            catalog: MessageCatalog::standard(),
            diagnostics,
            notices: None,
            hooks: HookRegistry::standard(),
            listener: None,
            on_completed: None,
            state: MoveState::Idle,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: RelocationOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: MessageCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Failures with an I/O reason are posted here instead of logged.
    #[must_use]
    pub fn with_notices(mut self, notices: NoticeSender) -> Self {
        self.notices = Some(notices);
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    #[must_use]
    pub fn with_listener(mut self, listener: &'a mut dyn MoveListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Invoked once, after the first relocation that completes.
    #[must_use]
    pub fn on_completed(mut self, callback: impl FnOnce() + 'a) -> Self {
        self.on_completed = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn state(&self) -> MoveState {
        self.state
    }

    fn enter(&mut self, state: MoveState) {
        debug!(from = ?self.state, to = ?state, "relocation state");
        self.state = state;
    }

    /// Capture element versions and discover references. Read-only.
    pub fn plan_move(
        &mut self,
        model: &dyn ProgramModel,
        elements: &[ElementId],
        destination: ElementId,
    ) -> Result<MovePlan, MoveError> {
        self.enter(MoveState::Collecting);
        let handle = |id: ElementId| {
            model
                .element(id)
                .map(|e| e.handle())
                .ok_or_else(|| MoveError::invariant(format!("unknown element {id}")))
        };
        let handles = elements
            .iter()
            .map(|&id| handle(id))
            .collect::<Result<Vec<_>, _>>();
        let plan = handles.and_then(|handles| {
            Ok(MovePlan {
                elements: handles,
                destination: handle(destination)?,
                references: find_references(model, elements, self.options.follow_descendants),
            })
        });
        if plan.is_err() {
            self.enter(MoveState::Aborted);
        }
        plan
    }

    /// Problems the move would run into, keyed by the element concerned.
    /// Read-only and infallible.
    pub fn detect_move_conflicts(
        &mut self,
        model: &dyn ProgramModel,
        plan: &MovePlan,
    ) -> ConflictRecord {
        self.enter(MoveState::ConflictCheck);
        let mut conflicts = ConflictRecord::new();
        let destination = plan.destination.id;

        if model.kind_of(destination) != Some(ElementKind::Directory) {
            conflicts.put(
                destination,
                self.catalog
                    .format(messages::NOT_A_DIRECTORY, &[&model.describe(destination)]),
            );
            return conflicts;
        }

        let mut incoming: HashSet<String> = HashSet::new();
        for handle in &plan.elements {
            let id = handle.id;
            let Some(element) = model.element(id) else {
                continue;
            };
            if !element.kind.is_relocatable() || element.parent.is_none() {
                conflicts.put(
                    id,
                    self.catalog
                        .format(messages::NOT_RELOCATABLE, &[&model.describe(id)]),
                );
                continue;
            }
            if element.kind == ElementKind::Directory && model.is_within(destination, id) {
                conflicts.put(
                    id,
                    self.catalog
                        .format(messages::MOVE_INTO_ITSELF, &[&model.describe(id)]),
                );
                continue;
            }
            if element.parent == Some(destination) {
                continue;
            }
            let clash = model
                .children(destination)
                .into_iter()
                .any(|c| model.element(c).is_some_and(|e| e.name == element.name));
            if clash || !incoming.insert(element.name.clone()) {
                conflicts.put(
                    id,
                    self.catalog.format(
                        messages::ALREADY_EXISTS,
                        &[&element.name, &model.describe(destination)],
                    ),
                );
            }
        }
        let clashes = self.symbol_clashes(model, plan, &conflicts);
        conflicts.merge(clashes);
        conflicts
    }

    /// Moved elements that would share a symbol name with an element outside
    /// the move, or with another moved element. Descendants take the new name
    /// of their moved ancestor as prefix. Elements already in `reported` are
    /// skipped.
    fn symbol_clashes(
        &self,
        model: &dyn ProgramModel,
        plan: &MovePlan,
        reported: &ConflictRecord,
    ) -> ConflictRecord {
        let destination = plan.destination.id;
        let moving: Vec<ElementId> = plan
            .elements
            .iter()
            .map(|h| h.id)
            .filter(|&id| {
                model.element(id).is_some_and(|e| {
                    e.kind.is_relocatable()
                        && e.parent.is_some()
                        && e.parent != Some(destination)
                })
            })
            .collect();
        let root = root_of(model, destination);

        let mut taken: HashMap<String, ElementId> = HashMap::new();
        for id in model.descendants(root) {
            if moving.iter().any(|&m| model.is_within(id, m)) {
                continue;
            }
            if let Some(name) = model.symbol_name(id) {
                taken.entry(name).or_insert(id);
            }
        }

        let mut clashes = ConflictRecord::new();
        for &id in &moving {
            if reported.contains(id) {
                continue;
            }
            let (Some(old), Some(new)) =
                (model.symbol_name(id), model.symbol_name_in(id, destination))
            else {
                continue;
            };
            let mut renamed = vec![(id, new.clone())];
            for descendant in model.descendants(id) {
                if let Some(rest) = model
                    .symbol_name(descendant)
                    .and_then(|name| name.strip_prefix(old.as_str()).map(str::to_string))
                {
                    renamed.push((descendant, format!("{new}{rest}")));
                }
            }
            for (element, name) in renamed {
                match taken.get(&name) {
                    Some(&other) => clashes.put(
                        id,
                        self.catalog.format(
                            messages::SYMBOL_CLASH,
                            &[&model.describe(element), &name, &model.describe(other)],
                        ),
                    ),
                    None => {
                        taken.insert(name, element);
                    }
                }
            }
        }
        clashes
    }

    /// Apply a plan. Stops at the first error.
    ///
    /// A failure with an I/O reason is posted as a notice; any other failure
    /// goes to the diagnostics sink. Moves already performed stay in place
    /// unless `rollback_on_failure` is set and the failure happened while
    /// moving.
    pub fn apply_move(
        &mut self,
        model: &mut dyn ProgramModel,
        plan: &MovePlan,
    ) -> Result<MoveReport, MoveError> {
        self.enter(MoveState::Applying);
        match self.apply_phases(model, plan) {
            Ok(report) => {
                self.enter(MoveState::Completed);
                info!(
                    moved = report.moved.len(),
                    rebound = report.rebound,
                    skipped = report.skipped,
                    "relocation completed"
                );
                if let Some(callback) = self.on_completed.take() {
                    callback();
                }
                Ok(report)
            }
            Err(err) => {
                self.enter(MoveState::Aborted);
                self.report_failure(&err);
                Err(err)
            }
        }
    }

    /// Plan, check conflicts, and apply unless `confirm` declines.
    ///
    /// `confirm` is only asked when there are conflicts.
    pub fn run(
        &mut self,
        model: &mut dyn ProgramModel,
        elements: &[ElementId],
        destination: ElementId,
        confirm: impl FnOnce(&ConflictRecord) -> bool,
    ) -> Result<MoveOutcome, MoveError> {
        let plan = self.plan_move(&*model, elements, destination)?;
        let conflicts = self.detect_move_conflicts(&*model, &plan);
        if !conflicts.is_empty() && !confirm(&conflicts) {
            self.enter(MoveState::Aborted);
            return Ok(MoveOutcome::Rejected(conflicts));
        }
        self.apply_move(model, &plan).map(MoveOutcome::Completed)
    }

    fn apply_phases(
        &mut self,
        model: &mut dyn ProgramModel,
        plan: &MovePlan,
    ) -> Result<MoveReport, MoveError> {
        validate_plan(&*model, plan)?;
        let destination = plan.destination.id;
        let mut report = MoveReport::default();
        let mut applied: Vec<(ElementId, ElementId)> = Vec::new();
        let mut moved_files: Vec<ElementId> = Vec::new();

        for handle in &plan.elements {
            let id = handle.id;
            let old_path = model.path_of(id);
            let old_parent = model.element(id).and_then(|e| e.parent);
            let result = match model.kind_of(id) {
                Some(ElementKind::Directory) => {
                    if self.options.follow_descendants {
                        for file in files_below(&*model, id) {
                            self.hooks.prepare(&*model, file);
                            moved_files.push(file);
                        }
                    }
                    model.move_directory(id, destination)
                }
                Some(ElementKind::File(_)) => {
                    self.hooks.prepare(&*model, id);
                    moved_files.push(id);
                    model.move_file(id, destination)
                }
                _ => Err(MoveError::invariant(format!(
                    "{} is neither a file nor a directory",
                    model.describe(id)
                ))),
            };
            if let Err(err) = result {
                if self.options.rollback_on_failure {
                    self.roll_back(model, &applied);
                }
                return Err(err);
            }
            if let Some(parent) = old_parent {
                applied.push((id, parent));
            }
            if let Some(listener) = self.listener.as_deref_mut() {
                listener.element_moved(id);
            }
            report.moved.push(MovedElement {
                element: id,
                new_path: model.path_of(id),
                old_path,
            });
        }

        self.enter(MoveState::Rebinding);
        for index in rebind_order(&plan.references) {
            let pending = &plan.references[index];
            let reference = &pending.reference;
            if reference.shape == RefShape::Path && reference.owner == pending.target {
                report.skipped += 1;
                continue;
            }
            model.rebind(reference, pending.target)?;
            report.rebound += 1;
        }

        self.enter(MoveState::Finalizing);
        let mut finalized = HashSet::new();
        for file in moved_files {
            if finalized.insert(file) {
                report.hook_rewrites += self.hooks.finalize(model, file)?;
            }
        }
        Ok(report)
    }

    fn roll_back(&self, model: &mut dyn ProgramModel, applied: &[(ElementId, ElementId)]) {
        for &(id, parent) in applied.iter().rev() {
            let result = match model.kind_of(id) {
                Some(ElementKind::Directory) => model.move_directory(id, parent),
                _ => model.move_file(id, parent),
            };
            if let Err(err) = result {
                self.diagnostics.internal_error("rollback", &err);
            }
        }
        debug!(reverted = applied.len(), "rolled back partial relocation");
    }

    fn report_failure(&self, err: &MoveError) {
        match (err.io_reason(), &self.notices) {
            (Some(reason), Some(notices)) => notices.post(Notice {
                title: self.catalog.template(messages::ERROR_TITLE).to_string(),
                message: reason,
            }),
            (Some(reason), None) => self.diagnostics.warn(&reason),
            (None, _) => self.diagnostics.internal_error("relocation", err),
        }
    }
}

impl std::fmt::Debug for RelocationProcessor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelocationProcessor")
            .field("options", &self.options)
            .field("state", &self.state)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

/// Order in which pending references are rebound, as indices into `references`.
///
/// References of one owner are rebound from the highest start offset down, so
/// a rewrite never shifts text that a later rewrite still has to find. Each
/// owner keeps the list positions its references originally occupied.
#[must_use]
pub fn rebind_order(references: &[PendingReference]) -> Vec<usize> {
    let mut by_owner: HashMap<ElementId, Vec<usize>> = HashMap::new();
    for (i, pending) in references.iter().enumerate() {
        by_owner.entry(pending.reference.owner).or_default().push(i);
    }

    let mut order: Vec<usize> = (0..references.len()).collect();
    for slots in by_owner.values() {
        let mut sorted = slots.clone();
        sorted.sort_by(|&a, &b| {
            references[b]
                .reference
                .range
                .start
                .cmp(&references[a].reference.range.start)
        });
        for (&slot, &index) in slots.iter().zip(&sorted) {
            order[slot] = index;
        }
    }
    order
}

fn validate_plan(model: &dyn ProgramModel, plan: &MovePlan) -> Result<(), MoveError> {
    for handle in plan.elements.iter().chain(std::iter::once(&plan.destination)) {
        let current = model.element(handle.id).map(|e| e.version);
        if current != Some(handle.version) {
            return Err(MoveError::invariant(format!(
                "stale plan: {} changed since planning",
                model.describe(handle.id)
            )));
        }
    }
    for pending in &plan.references {
        if model.reference(pending.reference.id).as_ref() != Some(&pending.reference) {
            return Err(MoveError::invariant(format!(
                "stale plan: reference {} in {} changed since planning",
                pending.reference.id.0,
                model.path_of(pending.reference.owner)
            )));
        }
    }
    Ok(())
}

fn root_of(model: &dyn ProgramModel, id: ElementId) -> ElementId {
    let mut current = id;
    while let Some(parent) = model.element(current).and_then(|e| e.parent) {
        current = parent;
    }
    current
}

fn files_below(model: &dyn ProgramModel, dir: ElementId) -> Vec<ElementId> {
    model
        .descendants(dir)
        .into_iter()
        .filter(|&d| model.kind_of(d).is_some_and(|k| k.is_file()))
        .collect()
}
