use serde::{Deserialize, Serialize};

use super::element::ElementId;

/// Stable identity of a reference in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceId(pub u32);

/// How a reference is spelled in its owner's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefShape {
    /// Relative textual path (`../a/Foo.txt`).
    Path,
    /// Qualified-name link (`a.Foo.Bar`).
    Symbolic,
}

impl RefShape {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Path => "path",
            Self::Symbolic => "symbolic",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(Self::Path),
            "symbolic" => Some(Self::Symbolic),
            _ => None,
        }
    }
}

/// Half-open byte range inside an owner's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A usage site inside `owner` pointing at `target`.
///
/// Values of this type are snapshots: `range` and `text` describe the owner's
/// content at the moment the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub id: ReferenceId,
    /// The file whose text contains the reference.
    pub owner: ElementId,
    pub target: ElementId,
    pub shape: RefShape,
    pub range: TextRange,
    /// Text found at `range` when the snapshot was taken.
    pub text: String,
}
