//! Minimal syntax trees for function bodies.
//!
//! Only the shapes conflict analysis looks at are modelled: nested blocks,
//! call expressions and leaves. Everything else a body may contain is a
//! `Name` or `Literal` leaf.

use serde::{Deserialize, Serialize};

use super::element::ElementId;

/// A node of a function body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum SyntaxNode {
    Block { body: Vec<SyntaxNode> },
    Call(CallExpr),
    Lambda { body: Box<SyntaxNode> },
    Name { ident: String },
    Literal { text: String },
}

impl SyntaxNode {
    #[must_use]
    pub fn block(body: Vec<SyntaxNode>) -> Self {
        Self::Block { body }
    }

    #[must_use]
    pub fn call(callee: Callee) -> Self {
        Self::Call(CallExpr {
            callee,
            args: Vec::new(),
        })
    }
}

/// A call expression and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallExpr {
    pub callee: Callee,
    #[serde(default)]
    pub args: Vec<SyntaxNode>,
}

/// What the host's name resolution knows about a call target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Callee {
    /// Resolved by plain name lookup.
    Direct(ElementId),
    /// Only reachable through inference (dynamic dispatch, implicit overloads).
    Implicit(ElementId),
    /// The host could not resolve the callee.
    Unresolved(String),
}

/// Controls which callee candidates resolution may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveContext {
    pub allow_implicits: bool,
}

impl ResolveContext {
    #[must_use]
    pub fn no_implicits() -> Self {
        Self {
            allow_implicits: false,
        }
    }

    #[must_use]
    pub fn with_implicits() -> Self {
        Self {
            allow_implicits: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_tree_json_shape() {
        let tree = SyntaxNode::block(vec![SyntaxNode::Call(CallExpr {
            callee: Callee::Direct(ElementId(7)),
            args: vec![SyntaxNode::Literal { text: "1".into() }],
        })]);
        let json = serde_json::to_string(&tree).unwrap();
        assert!(json.contains("\"node\":\"block\""));
        assert!(json.contains("\"direct\":7"));
        let back: SyntaxNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn call_args_default_to_empty() {
        let call: CallExpr = serde_json::from_str(r#"{"callee":{"unresolved":"print"}}"#).unwrap();
        assert!(call.args.is_empty());
        assert_eq!(call.callee, Callee::Unresolved("print".into()));
    }
}
