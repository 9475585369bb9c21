//! Error types for catalog construction and object store operations.

use thiserror::Error;

/// Result type alias for reconcile operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a catalog or touching the object store.
#[derive(Debug, Error)]
pub enum Error {
    /// The addressed node does not exist in the store
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// A node id was empty or contained empty segments
    #[error("invalid node id: {0:?}")]
    InvalidId(String),

    /// A store operation failed
    #[error("store {operation} failed for {id}: {message}")]
    Store {
        /// Operation that failed (create, write, delete, ...)
        operation: &'static str,
        /// Node the operation targeted
        id: String,
        /// Backend-specific error message
        message: String,
    },

    /// The catalog violates one of its structural rules
    #[error("invalid catalog: {0}")]
    Catalog(String),
}

impl Error {
    /// Create a store error.
    pub fn store(operation: &'static str, id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            operation,
            id: id.into(),
            message: message.into(),
        }
    }

    /// The node id this error refers to, if any.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::NodeNotFound(id) | Self::InvalidId(id) => Some(id),
            Self::Store { id, .. } => Some(id),
            Self::Catalog(_) => None,
        }
    }
}
