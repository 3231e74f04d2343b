//! Conflict analysis for pushing members from a base class into subclasses.

use std::collections::HashSet;

use crate::error::MoveError;
use crate::models::{
    walk, CallExpr, ConflictRecord, ElementId, ElementKind, MemberInfo, ProgramModel,
    ResolveContext, VisitResult, Visitor,
};

use super::diagnostics::Diagnostics;
use super::messages::{self, MessageCatalog};

/// Collects conflicts for one push-down of `members` out of `class`.
///
/// Both checks only read the model and never fail; unexpected member kinds
/// are reported to the diagnostics sink.
pub struct PushDownConflicts<'a> {
    model: &'a dyn ProgramModel,
    catalog: &'a MessageCatalog,
    diagnostics: &'a dyn Diagnostics,
    class: ElementId,
    members: &'a [MemberInfo],
    moved: HashSet<ElementId>,
    conflicts: ConflictRecord,
}

impl<'a> PushDownConflicts<'a> {
    #[must_use]
    pub fn new(
        model: &'a dyn ProgramModel,
        catalog: &'a MessageCatalog,
        diagnostics: &'a dyn Diagnostics,
        class: ElementId,
        members: &'a [MemberInfo],
    ) -> Self {
        Self {
            model,
            catalog,
            diagnostics,
            class,
            members,
            moved: members.iter().map(|m| m.member).collect(),
            conflicts: ConflictRecord::new(),
        }
    }

    /// Selected functions that `target` already declares under the same name.
    pub fn check_target_class_conflicts(&mut self, target: ElementId) {
        for info in self.members {
            let member = info.member;
            match self.model.kind_of(member) {
                Some(ElementKind::Function) => {
                    let Some(name) = self.model.element(member).map(|e| e.name.as_str()) else {
                        continue;
                    };
                    let overridden = self
                        .model
                        .methods(target)
                        .into_iter()
                        .any(|m| self.model.element(m).is_some_and(|e| e.name == name));
                    if overridden {
                        let message = self.catalog.format(
                            messages::ALREADY_OVERRIDDEN,
                            &[&self.model.describe(member), &self.model.describe(target)],
                        );
                        self.conflicts.put(member, message);
                    }
                }
                Some(ElementKind::Class) => {}
                _ => {
                    let err = MoveError::invariant(format!(
                        "unexpected push-down member {}",
                        self.model.describe(member)
                    ));
                    self.diagnostics.internal_error("push-down", &err);
                }
            }
        }
    }

    /// Methods staying in the source class that call a selected member.
    pub fn check_source_class_conflicts(&mut self) {
        for method in self.model.methods(self.class) {
            if self.moved.contains(&method) {
                continue;
            }
            let Some(body) = self.model.body(method) else {
                continue;
            };
            let mut collector = UsedMembersCollector {
                model: self.model,
                moved: &self.moved,
                used: Vec::new(),
            };
            walk(&mut collector, body);
            for member in collector.used {
                let message = self.catalog.format(
                    messages::USES_PUSHED_DOWN,
                    &[&self.model.describe(method), &self.model.describe(member)],
                );
                self.conflicts.put(method, message);
            }
        }
    }

    #[must_use]
    pub fn conflicts(&self) -> &ConflictRecord {
        &self.conflicts
    }

    #[must_use]
    pub fn into_conflicts(self) -> ConflictRecord {
        self.conflicts
    }
}

/// Selected members a body calls, resolved without implicit candidates.
struct UsedMembersCollector<'a> {
    model: &'a dyn ProgramModel,
    moved: &'a HashSet<ElementId>,
    used: Vec<ElementId>,
}

impl Visitor for UsedMembersCollector<'_> {
    fn visit_call(&mut self, call: &CallExpr) -> VisitResult {
        if let Some(callee) = self
            .model
            .resolve_callee(call, ResolveContext::no_implicits())
        {
            if self.moved.contains(&callee) && !self.used.contains(&callee) {
                self.used.push(callee);
            }
        }
        VisitResult::Continue
    }
}

/// Run both checks for pushing `members` from `class` into every class in
/// `targets`.
pub fn analyze_push_down_conflicts(
    model: &dyn ProgramModel,
    catalog: &MessageCatalog,
    diagnostics: &dyn Diagnostics,
    class: ElementId,
    members: &[MemberInfo],
    targets: &[ElementId],
) -> ConflictRecord {
    let mut analysis = PushDownConflicts::new(model, catalog, diagnostics, class, members);
    for &target in targets {
        analysis.check_target_class_conflicts(target);
    }
    analysis.check_source_class_conflicts();
    let conflicts = analysis.into_conflicts();
    tracing::debug!(
        members = members.len(),
        targets = targets.len(),
        conflicts = conflicts.len(),
        "push-down analysis finished"
    );
    conflicts
}
