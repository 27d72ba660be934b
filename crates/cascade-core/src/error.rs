//! Core error types.

use thiserror::Error;
use uuid::Uuid;

use crate::types::DataType;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for core operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by the data model and the revision store.
#[derive(Debug, Error)]
pub enum Error {
    /// A textual type name matched no known alias.
    #[error("unknown {what} '{alias}'")]
    UnknownAlias {
        /// Which alias table was consulted.
        what: &'static str,
        /// The rejected spelling.
        alias: String,
    },

    /// A value could not be coerced into its declared type.
    #[error("cannot parse value as {data_type}: {message}")]
    ValueParse {
        /// Declared target type.
        data_type: DataType,
        /// Why coercion failed.
        message: String,
    },

    /// A revision or interface is structurally invalid.
    #[error("invalid revision: {0}")]
    InvalidRevision(String),

    /// No revision with this id exists in the store.
    #[error("transformation revision {0} not found")]
    RevisionNotFound(Uuid),

    /// The store backend failed.
    #[error("revision store error: {0}")]
    Store(#[source] BoxedError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wraps an arbitrary backend failure.
    pub fn store(error: impl Into<BoxedError>) -> Self {
        Self::Store(error.into())
    }

    /// Returns true if the error reports a missing revision.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RevisionNotFound(_))
    }
}
