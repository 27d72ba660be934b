//! Remote runtime access.
//!
//! When a runtime URL is configured, execution inputs are posted to
//! `{url}/runtime` instead of running in process.

mod auth;
mod client;
mod config;
mod error;

pub use self::auth::{NoAuth, StaticToken, TokenProvider};
pub use self::client::RemoteRuntimeClient;
pub use self::config::{RemoteRuntimeConfig, DEFAULT_TIMEOUT_SECS};

/// Tracing target for remote runtime calls.
pub const TRACING_TARGET: &str = "cascade_runtime::remote";
