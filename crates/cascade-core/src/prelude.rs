//! Prelude module for convenient imports.
//!
//! ```rust
//! use cascade_core::prelude::*;
//! ```

pub use crate::error::{Error, Result};
pub use crate::revision::{
    CodeContent, Connection, Endpoint, Input, InputKind, IoInterface, IoMapping, Operator,
    OperatorId, Output, RevisionContent, RevisionKind, RevisionState, TransformationRevision,
    WorkflowContent,
};
pub use crate::store::{MemoryRevisionStore, RevisionQuery, RevisionStore};
pub use crate::types::{DataType, ExternalType, GeneralType, parse_value};
pub use crate::wiring::{IoWiring, Wiring};
pub use crate::{MeasuredSteps, Timing};
