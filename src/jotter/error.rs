use crate::model::NoteId;
use thiserror::Error;

/// Why a parent link was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyViolation {
    #[error("note {0} cannot be its own parent")]
    SelfParent(NoteId),

    #[error("moving note {id} under {parent} would make it its own ancestor")]
    Cycle { id: NoteId, parent: NoteId },

    #[error("parent note {0} does not exist")]
    MissingParent(NoteId),
}

#[derive(Error, Debug)]
pub enum JotterError {
    #[error("Note not found: {0}")]
    NoteNotFound(NoteId),

    #[error("Invalid hierarchy: {0}")]
    InvalidHierarchy(#[from] HierarchyViolation),

    #[error("Version {version} not found for note {id}")]
    VersionNotFound { id: NoteId, version: u64 },

    #[error("Ambiguous note id '{0}' matches more than one note")]
    AmbiguousId(String),

    #[error("Corrupt data: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("{0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, JotterError>;
