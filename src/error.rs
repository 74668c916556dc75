//! Error taxonomy for resolution requests.
//!
//! Only a handful of conditions surface as request failures; clicks on
//! non-identifiers, builtins and unit names all degrade to empty or
//! partial successful results and have no variant here.

use thiserror::Error;

use crate::snapshot::{FastResolveError, SnapshotError};

pub type Result<T> = std::result::Result<T, ResolveError>;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The request position is outside the document's bounds.
    #[error("invalid position: {file}:{line}:{character} ({reason})")]
    InvalidPosition {
        file: String,
        line: u32,
        character: u32,
        reason: String,
    },

    /// The request names a document outside the managed workspace.
    #[error("{method} not yet supported for out-of-workspace URI ({uri})")]
    OutOfWorkspaceUri { method: &'static str, uri: String },

    /// An identifier was found at the position but no declaration resolves
    /// for it.
    #[error("definition not found")]
    DefinitionNotFound,

    /// The request was cancelled before resolution finished.
    #[error("request cancelled")]
    Cancelled,

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    FastResolve(#[from] FastResolveError),
}
