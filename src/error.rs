//! Errors surfaced at the content store boundary

use thiserror::Error;

/// Result alias for store operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by the content store and the visibility policy
#[derive(Debug, Error)]
pub enum Error {
    /// A write was rejected; nothing was stored
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The record does not exist or is not visible to the requester
    #[error("not found")]
    NotFound,

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store snapshot is malformed: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot was written by an incompatible version
    #[error("unsupported store snapshot version {0}")]
    UnsupportedVersion(u32),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

/// A rejected field on an Article or Bureau
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {kind}")]
pub struct ValidationError {
    pub field: &'static str,
    pub kind: ValidationKind,
}

impl ValidationError {
    pub fn new(field: &'static str, kind: ValidationKind) -> Self {
        Self { field, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationKind {
    #[error("this field is required")]
    Required,
    #[error("must be at most {max} characters")]
    TooLong { max: usize },
    #[error("may only contain letters, digits, hyphens and underscores")]
    InvalidSlug,
    #[error("is already used by another bureau")]
    DuplicateSlug,
    #[error("bureau {0} does not exist")]
    UnknownBureau(u64),
}
