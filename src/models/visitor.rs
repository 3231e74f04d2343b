//! Read-only traversal over function bodies.
//!
//! Traversal is depth-first, pre-order, children in source order. A visitor
//! overrides the `visit_*` hooks it cares about; returning
//! [`VisitResult::SkipChildren`] prunes the subtree below the current node.

use super::syntax::{CallExpr, SyntaxNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitResult {
    Continue,
    SkipChildren,
}

pub trait Visitor {
    fn visit_call(&mut self, _call: &CallExpr) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_lambda(&mut self, _body: &SyntaxNode) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_name(&mut self, _ident: &str) {}
}

/// Walk `node` and all of its descendants.
pub fn walk<V: Visitor + ?Sized>(visitor: &mut V, node: &SyntaxNode) {
    match node {
        SyntaxNode::Block { body } => {
            for child in body {
                walk(visitor, child);
            }
        }
        SyntaxNode::Call(call) => {
            if visitor.visit_call(call) == VisitResult::Continue {
                for arg in &call.args {
                    walk(visitor, arg);
                }
            }
        }
        SyntaxNode::Lambda { body } => {
            if visitor.visit_lambda(body) == VisitResult::Continue {
                walk(visitor, body);
            }
        }
        SyntaxNode::Name { ident } => visitor.visit_name(ident),
        SyntaxNode::Literal { .. } => {}
    }
}
