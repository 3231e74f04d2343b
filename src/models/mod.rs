pub mod conflict;
pub mod element;
pub mod member;
pub mod program;
pub mod reference;
pub mod syntax;
pub mod visitor;

pub use conflict::{ConflictEntry, ConflictRecord};
pub use element::{Element, ElementHandle, ElementId, ElementKind, FileKind};
pub use member::MemberInfo;
pub use program::ProgramModel;
pub use reference::{RefShape, Reference, ReferenceId, TextRange};
pub use syntax::{CallExpr, Callee, ResolveContext, SyntaxNode};
pub use visitor::{walk, VisitResult, Visitor};
