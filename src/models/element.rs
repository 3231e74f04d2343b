use serde::{Deserialize, Serialize};

/// Stable identity of a node in the containment tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u32);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An element identity together with the version observed when it was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ElementHandle {
    pub id: ElementId,
    pub version: u32,
}

/// File flavour, used to select pre/post-move hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    Plain,
    Markup,
    Source,
}

impl FileKind {
    /// Classify a file name by its extension.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "md" | "markdown" | "html" | "htm" => Self::Markup,
            "py" | "rs" | "js" | "ts" | "java" | "go" => Self::Source,
            _ => Self::Plain,
        }
    }
}

/// The kind of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ElementKind {
    Directory,
    File(FileKind),
    Class,
    Function,
}

impl ElementKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Directory => "dir",
            Self::File(FileKind::Plain) => "file",
            Self::File(FileKind::Markup) => "markup",
            Self::File(FileKind::Source) => "source",
            Self::Class => "class",
            Self::Function => "fn",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dir" => Some(Self::Directory),
            "file" => Some(Self::File(FileKind::Plain)),
            "markup" => Some(Self::File(FileKind::Markup)),
            "source" => Some(Self::File(FileKind::Source)),
            "class" => Some(Self::Class),
            "fn" => Some(Self::Function),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// Files and directories are the only elements with a physical location.
    #[must_use]
    pub fn is_relocatable(&self) -> bool {
        matches!(self, Self::Directory | Self::File(_))
    }
}

/// A node of the project's containment tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    /// Display name (file name, class name, ...). Empty for the project root.
    pub name: String,
    /// Containing element; `None` only for the project root.
    pub parent: Option<ElementId>,
    /// Bumped on every move and every text change.
    pub version: u32,
}

impl Element {
    #[must_use]
    pub fn handle(&self) -> ElementHandle {
        ElementHandle {
            id: self.id,
            version: self.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_kind_round_trip() {
        for k in [
            ElementKind::Directory,
            ElementKind::File(FileKind::Plain),
            ElementKind::File(FileKind::Markup),
            ElementKind::File(FileKind::Source),
            ElementKind::Class,
            ElementKind::Function,
        ] {
            assert_eq!(ElementKind::parse(k.as_str()), Some(k));
        }
        assert_eq!(ElementKind::parse("module"), None);
    }

    #[test]
    fn file_kind_from_extension() {
        assert_eq!(FileKind::from_name("README.md"), FileKind::Markup);
        assert_eq!(FileKind::from_name("shapes.PY"), FileKind::Source);
        assert_eq!(FileKind::from_name("Foo.txt"), FileKind::Plain);
        assert_eq!(FileKind::from_name("Makefile"), FileKind::Plain);
    }

    #[test]
    fn only_files_and_directories_relocate() {
        assert!(ElementKind::Directory.is_relocatable());
        assert!(ElementKind::File(FileKind::Plain).is_relocatable());
        assert!(!ElementKind::Class.is_relocatable());
        assert!(!ElementKind::Function.is_relocatable());
    }
}
