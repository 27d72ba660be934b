#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
pub mod revision;
pub mod store;
mod timing;
pub mod types;
pub mod wiring;

#[doc(hidden)]
pub mod prelude;

pub use error::{BoxedError, Error, Result};
pub use timing::{MeasuredSteps, Timing};

/// Tracing target for core operations.
pub const TRACING_TARGET: &str = "cascade_core";
