use thiserror::Error;

#[derive(Error, Debug)]
pub enum RestructureError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model not found: run `restructure import <snapshot>` first")]
    ModelNotFound,

    #[error("element not found: {address}")]
    ElementNotFound { address: String },

    #[error("snapshot error: {detail}")]
    Snapshot { detail: String },

    #[error("conflicts detected: {count} element(s) affected, rerun with --force to apply anyway")]
    ConflictsDetected { count: usize },

    #[error(transparent)]
    Move(#[from] MoveError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RestructureError>;

/// Failures of the apply phase of a relocation.
#[derive(Error, Debug)]
pub enum MoveError {
    /// Physical relocation of a file or directory failed.
    #[error("cannot relocate {element}: {detail}")]
    StructuralIo {
        element: String,
        detail: String,
        #[source]
        cause: Option<std::io::Error>,
    },

    /// A defect: unexpected element kind, stale plan, unresolvable reference.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl MoveError {
    pub fn structural(element: impl Into<String>, cause: std::io::Error) -> Self {
        Self::StructuralIo {
            element: element.into(),
            detail: cause.to_string(),
            cause: Some(cause),
        }
    }

    pub fn invariant(detail: impl Into<String>) -> Self {
        Self::InternalInvariant(detail.into())
    }

    /// The lower-level I/O reason worth showing to the user, if any.
    #[must_use]
    pub fn io_reason(&self) -> Option<String> {
        match self {
            Self::StructuralIo {
                cause: Some(cause), ..
            } => Some(cause.to_string()),
            _ => None,
        }
    }
}
