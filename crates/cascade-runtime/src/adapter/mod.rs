//! Adapter plugin contract.
//!
//! An [`Adapter`] loads values for wired inputs and sends values of wired
//! outputs. Adapters are looked up by id in an [`AdapterRegistry`] and always
//! receive an explicit [`AdapterContext`] holding the catalog of the running
//! execution.

pub mod component;
mod registry;

use std::collections::BTreeMap;
use std::fmt;

use cascade_core::types::ExternalType;
use cascade_core::wiring::{IoWiring, RefIdType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, IntoStaticStr};

pub use self::registry::AdapterRegistry;
use crate::catalog::Catalog;
use crate::error::AdapterError;
use crate::executor::LocalExecutor;

/// Direction of a fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    /// Inputs are loaded from sources.
    Load,
    /// Outputs are sent to sinks.
    Send,
}

impl Direction {
    /// Returns how a component used in this direction is called.
    pub const fn usage(&self) -> &'static str {
        match self {
            Self::Load => "source",
            Self::Send => "sink",
        }
    }
}

/// Adapter-facing part of one binding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BindingDescriptor {
    #[serde(default)]
    pub ref_id: Option<String>,
    #[serde(default)]
    pub ref_id_type: Option<RefIdType>,
    #[serde(default)]
    pub ref_key: Option<String>,
    #[serde(default, rename = "type")]
    pub external_type: Option<ExternalType>,
    #[serde(default)]
    pub filters: BTreeMap<String, Value>,
}

impl BindingDescriptor {
    /// Returns the effective reference: `ref_key` when set, else `ref_id`.
    pub fn reference(&self) -> Option<&str> {
        self.ref_key.as_deref().or(self.ref_id.as_deref())
    }
}

impl From<&IoWiring> for BindingDescriptor {
    fn from(wiring: &IoWiring) -> Self {
        Self {
            ref_id: wiring.ref_id.clone(),
            ref_id_type: wiring.ref_id_type,
            ref_key: wiring.ref_key.clone(),
            external_type: wiring.external_type,
            filters: wiring.filters.clone(),
        }
    }
}

impl fmt::Display for BindingDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}

/// Ambient state of one execution, passed to every adapter call.
#[derive(Clone, Copy)]
pub struct AdapterContext<'a> {
    catalog: &'a Catalog,
    executor: &'a LocalExecutor,
}

impl<'a> AdapterContext<'a> {
    /// Creates a context.
    pub fn new(catalog: &'a Catalog, executor: &'a LocalExecutor) -> Self {
        Self { catalog, executor }
    }

    /// Code modules and components of the running execution.
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Executor for sub-executions started by adapters.
    pub fn executor(&self) -> &'a LocalExecutor {
        self.executor
    }
}

impl fmt::Debug for AdapterContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterContext")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

/// Backend providing load and send semantics for bindings.
#[async_trait::async_trait]
pub trait Adapter: Send + Sync {
    /// Adapter id used as `adapter_id` in wirings.
    fn id(&self) -> &str;

    /// Loads one value per binding name.
    async fn load(
        &self,
        ctx: &AdapterContext<'_>,
        bindings: &BTreeMap<String, BindingDescriptor>,
    ) -> Result<BTreeMap<String, Value>, AdapterError>;

    /// Sends one value per binding name.
    ///
    /// Pure sinks return an empty map.
    async fn send(
        &self,
        ctx: &AdapterContext<'_>,
        bindings: &BTreeMap<String, BindingDescriptor>,
        values: &BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, AdapterError> {
        let _ = (ctx, bindings, values);
        Err(AdapterError::new(format!(
            "adapter '{}' does not support sending",
            self.id()
        )))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_descriptor_from_wiring() {
        let wiring = IoWiring::new("x", "sql-adapter")
            .with_ref_id("table")
            .with_type(ExternalType::DataFrame)
            .with_filter("limit", json!(10));

        let descriptor = BindingDescriptor::from(&wiring);
        assert_eq!(descriptor.reference(), Some("table"));
        assert_eq!(descriptor.external_type, Some(ExternalType::DataFrame));
        assert_eq!(descriptor.filters["limit"], json!(10));
        assert!(descriptor.to_string().contains("\"type\":\"dataframe\""));
    }

    #[test]
    fn test_direction_usage() {
        assert_eq!(Direction::Load.usage(), "source");
        assert_eq!(Direction::Send.to_string(), "send");
    }
}
