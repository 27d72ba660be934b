//! Prelude module for convenient imports.
//!
//! ```rust
//! use cascade_runtime::prelude::*;
//! ```

pub use crate::adapter::component::{
    ComponentAdapter, ComponentAdapterConfig, ComponentAdapterStructure,
};
pub use crate::adapter::{Adapter, AdapterContext, AdapterRegistry, BindingDescriptor, Direction};
pub use crate::engine::{Engine, EngineConfig, ExecutionDispatcher, ExecutionMode, ExecutionRequest};
pub use crate::error::{AdapterError, Error, ErrorKind, Result};
pub use crate::executor::{BodyCall, BodyRegistry, ComponentBody, LocalExecutor};
pub use crate::flatten::{FlattenedNode, flatten};
pub use crate::payload::{ExecutionInput, ExecutionResult, ExecutionStatus};
pub use crate::remote::{NoAuth, RemoteRuntimeClient, RemoteRuntimeConfig, StaticToken, TokenProvider};
pub use crate::{ExecutionInputAssembler, TRACING_TARGET};
