//! Runtime error types.
//!
//! Errors are split by the phase that detects them. Binding and input
//! validation failures mean the request is misconfigured. An inconsistent
//! revision closure is an internal fault. Adapter, transport and result
//! failures happen while talking to collaborators. Failures of the
//! executed logic itself are not errors at all: they travel verbatim inside
//! [`ExecutionResult::error`](crate::ExecutionResult).

use std::collections::BTreeMap;
use std::fmt;

use cascade_core::BoxedError;
use strum::{AsRefStr, Display, IntoStaticStr};
use thiserror::Error;
use uuid::Uuid;

use crate::adapter::{BindingDescriptor, Direction};

/// Result type for runtime operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of runtime errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Integrity,
    ComponentsNotFound,
    AdapterHandling,
    InputValidation,
    NotFound,
    RuntimeConnection,
    ResultValidation,
    Store,
    Serialization,
    Internal,
}

impl ErrorKind {
    /// Returns true for misconfigured requests detected before anything was
    /// executed.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::ComponentsNotFound | Self::InputValidation | Self::NotFound)
    }

    /// Returns true for faults of the runtime itself, which callers report
    /// as internal server errors.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Integrity | Self::Internal)
    }
}

/// Errors that can occur while preparing or dispatching an execution.
#[derive(Debug, Error)]
pub enum Error {
    /// The revision closure is incomplete or nests a workflow inside itself.
    ///
    /// Classified as internal, not as configuration.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// Components referenced through the component adapter are missing or
    /// unsuitable.
    #[error("component adapter components not found or invalid: {0}")]
    ComponentsNotFound(String),

    /// One or more bindings failed in an adapter fan-out.
    #[error(transparent)]
    AdapterHandling(#[from] AdapterError),

    /// The assembled execution input is inconsistent.
    #[error("execution input validation failed: {0}")]
    InputValidation(String),

    /// The requested revision does not exist.
    #[error("transformation revision {0} not found")]
    NotFound(Uuid),

    /// Credentials or transport to the remote runtime failed.
    #[error("runtime connection error: {message}")]
    RuntimeConnection {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },

    /// The remote runtime answered with something that is not a result.
    #[error("execution result validation failed: {message}")]
    ResultValidation {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },

    /// The revision store failed.
    #[error("revision store error: {0}")]
    Store(#[source] cascade_core::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Integrity(_) => ErrorKind::Integrity,
            Self::ComponentsNotFound(_) => ErrorKind::ComponentsNotFound,
            Self::AdapterHandling(_) => ErrorKind::AdapterHandling,
            Self::InputValidation(_) => ErrorKind::InputValidation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::RuntimeConnection { .. } => ErrorKind::RuntimeConnection,
            Self::ResultValidation { .. } => ErrorKind::ResultValidation,
            Self::Store(_) => ErrorKind::Store,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::RuntimeConnection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a result validation error.
    pub fn result_validation(message: impl Into<String>) -> Self {
        Self::ResultValidation {
            message: message.into(),
            source: None,
        }
    }
}

impl From<cascade_core::Error> for Error {
    fn from(error: cascade_core::Error) -> Self {
        match error {
            cascade_core::Error::RevisionNotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

/// Failure of one named binding.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingFailure {
    pub message: String,
    /// Binding as it was dispatched, when known.
    pub descriptor: Option<BindingDescriptor>,
}

/// Error raised by an adapter, or by a fan-out over several bindings.
///
/// An aggregated error lists every failed binding of its fan-out. Bindings
/// that succeeded are not part of it.
#[derive(Debug, Error)]
pub struct AdapterError {
    message: String,
    failures: BTreeMap<String, BindingFailure>,
    #[source]
    source: Option<BoxedError>,
}

impl AdapterError {
    /// Creates an error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            failures: BTreeMap::new(),
            source: None,
        }
    }

    /// Aggregates the failed bindings of one fan-out.
    pub fn aggregate(direction: Direction, failures: BTreeMap<String, BindingFailure>) -> Self {
        let message = match direction {
            Direction::Load => "errors when loading wired inputs",
            Direction::Send => "errors when sending wired outputs",
        };

        Self {
            message: message.into(),
            failures,
            source: None,
        }
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Failed bindings keyed by binding name.
    pub fn failures(&self) -> &BTreeMap<String, BindingFailure> {
        &self.failures
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "adapter handling error: {}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        if self.failures.is_empty() {
            return Ok(());
        }

        write!(f, ":")?;
        for (name, failure) in &self.failures {
            write!(f, "\n  {name}: {}", failure.message)?;
        }
        write!(f, "\nbinding descriptors by name where:")?;
        for (name, failure) in &self.failures {
            match &failure.descriptor {
                Some(descriptor) => write!(f, "\n  {name}: {descriptor}")?,
                None => write!(f, "\n  {name}: <unresolved>")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_kinds() {
        assert!(Error::ComponentsNotFound("x".into()).kind().is_configuration());
        assert!(!Error::Integrity("x".into()).kind().is_configuration());
        assert!(!Error::connection("x").kind().is_configuration());
        assert!(!Error::result_validation("x").kind().is_configuration());
    }

    #[test]
    fn test_internal_kinds() {
        assert!(Error::Integrity("x".into()).kind().is_internal());
        assert!(Error::Internal("x".into()).kind().is_internal());
        assert!(!Error::NotFound(Uuid::from_u128(1)).kind().is_internal());
        assert!(!Error::connection("x").kind().is_internal());
    }

    #[test]
    fn test_core_not_found_maps_to_not_found() {
        let id = Uuid::from_u128(7);
        let error: Error = cascade_core::Error::RevisionNotFound(id).into();
        assert!(matches!(error, Error::NotFound(found) if found == id));
    }

    #[test]
    fn test_aggregate_lists_every_failure() {
        let mut failures = BTreeMap::new();
        for name in ["a", "b"] {
            failures.insert(
                name.to_owned(),
                BindingFailure {
                    message: format!("{name} failed"),
                    descriptor: None,
                },
            );
        }

        let error = AdapterError::aggregate(Direction::Load, failures);
        let rendered = error.to_string();
        assert_eq!(error.failures().len(), 2);
        assert!(rendered.contains("a: a failed"));
        assert!(rendered.contains("b: b failed"));
        assert_eq!(Error::from(error).kind(), ErrorKind::AdapterHandling);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::ComponentsNotFound.to_string(), "components_not_found");
    }
}
