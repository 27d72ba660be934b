//! Execution pipeline.
//!
//! The [`Engine`] prepares execution inputs from stored revisions and hands
//! them to an [`ExecutionDispatcher`], which runs them in process or on a
//! remote runtime.

mod config;
mod dispatcher;
mod service;

pub use self::config::{EngineConfig, EngineConfigBuilder, DEFAULT_MAX_CONCURRENT_EXECUTIONS};
pub use self::dispatcher::{ExecutionDispatcher, ExecutionMode};
pub use self::service::{Engine, ExecutionRequest};

/// Tracing target for the execution pipeline.
pub const TRACING_TARGET: &str = "cascade_runtime::engine";
