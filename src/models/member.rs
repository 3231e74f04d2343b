use serde::Serialize;

use super::element::ElementId;

/// A class member selected for push-down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberInfo {
    pub member: ElementId,
    /// Keep an abstract declaration in the source class after pushing down.
    pub keep_abstract: bool,
}

impl MemberInfo {
    #[must_use]
    pub fn new(member: ElementId) -> Self {
        Self {
            member,
            keep_abstract: false,
        }
    }
}
