#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod adapter;
mod assemble;
mod catalog;
mod dispatch;
pub mod engine;
mod error;
pub mod executor;
mod flatten;
mod payload;
pub mod remote;
mod resolve;

#[cfg(test)]
mod fixtures;

#[doc(hidden)]
pub mod prelude;

pub use assemble::ExecutionInputAssembler;
pub use catalog::Catalog;
pub use dispatch::AdapterDispatcher;
pub use error::{AdapterError, BindingFailure, Error, ErrorKind, Result};
pub use flatten::{ComponentNode, FlattenedNode, WorkflowNode, flatten};
pub use payload::{
    CodeModule, ComponentRecord, Configuration, ExecutionInput, ExecutionResult, ExecutionStatus,
    MeasuredStep, RuntimeInfo, runtime_info,
};
pub use resolve::{BindingError, DispatchableBinding, component_execution, resolve};

/// Tracing target for runtime operations.
pub const TRACING_TARGET: &str = "cascade_runtime";
