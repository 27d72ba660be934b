//! Bindings of workflow inputs and outputs to adapters.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::error::{Error, Result};
use crate::revision::IoInterface;
use crate::types::ExternalType;

/// Adapter that provides or returns values inline, without I/O.
pub const DIRECT_PROVISIONING: &str = "direct_provisioning";

/// Adapter that runs another component as a source or sink.
pub const COMPONENT_ADAPTER: &str = "component-adapter";

/// Filter key holding a directly provisioned value.
pub const VALUE_FILTER: &str = "value";

/// Kind of entity a `ref_id` points to, for adapters that need it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RefIdType {
    Source,
    Sink,
    Thingnode,
}

/// One binding of a workflow input or output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoWiring {
    /// Interface name on the root revision.
    pub workflow_io_name: String,
    pub adapter_id: String,
    #[serde(default)]
    pub ref_id: Option<String>,
    #[serde(default)]
    pub ref_id_type: Option<RefIdType>,
    #[serde(default)]
    pub ref_key: Option<String>,
    #[serde(default, rename = "type")]
    pub external_type: Option<ExternalType>,
    /// Adapter-specific selection. Values may be arbitrary JSON.
    #[serde(default)]
    pub filters: BTreeMap<String, Value>,
}

impl IoWiring {
    /// Creates a binding to `adapter_id` without reference or filters.
    pub fn new(workflow_io_name: impl Into<String>, adapter_id: impl Into<String>) -> Self {
        Self {
            workflow_io_name: workflow_io_name.into(),
            adapter_id: adapter_id.into(),
            ref_id: None,
            ref_id_type: None,
            ref_key: None,
            external_type: None,
            filters: BTreeMap::new(),
        }
    }

    /// Creates a direct provisioning binding carrying `value`.
    pub fn direct(workflow_io_name: impl Into<String>, value: Value) -> Self {
        Self::new(workflow_io_name, DIRECT_PROVISIONING).with_filter(VALUE_FILTER, value)
    }

    /// Sets the reference id.
    #[must_use]
    pub fn with_ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = Some(ref_id.into());
        self
    }

    /// Sets the reference key.
    #[must_use]
    pub fn with_ref_key(mut self, ref_key: impl Into<String>) -> Self {
        self.ref_key = Some(ref_key.into());
        self
    }

    /// Sets the declared external type.
    #[must_use]
    pub fn with_type(mut self, external_type: ExternalType) -> Self {
        self.external_type = Some(external_type);
        self
    }

    /// Adds a filter entry.
    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.filters.insert(key.into(), value);
        self
    }

    /// Returns true for direct provisioning bindings.
    pub fn is_direct(&self) -> bool {
        self.adapter_id == DIRECT_PROVISIONING
    }

    /// Returns the effective reference: `ref_key` when set, else `ref_id`.
    pub fn reference(&self) -> Option<&str> {
        self.ref_key.as_deref().or(self.ref_id.as_deref())
    }
}

/// Named set of input and output bindings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Wiring {
    #[serde(default)]
    pub input_wirings: Vec<IoWiring>,
    #[serde(default)]
    pub output_wirings: Vec<IoWiring>,
}

impl Wiring {
    /// Creates a wiring.
    pub fn new(input_wirings: Vec<IoWiring>, output_wirings: Vec<IoWiring>) -> Self {
        Self {
            input_wirings,
            output_wirings,
        }
    }

    /// Returns true if neither direction has bindings.
    pub fn is_empty(&self) -> bool {
        self.input_wirings.is_empty() && self.output_wirings.is_empty()
    }

    /// Checks the bindings against the interface they are applied to.
    ///
    /// Every name must exist on the interface and be bound at most once per
    /// direction. Bindings to adapters other than direct provisioning need a
    /// reference.
    pub fn validate(&self, interface: &IoInterface) -> Result<()> {
        let mut seen = HashSet::new();
        for wiring in &self.input_wirings {
            if interface.input(&wiring.workflow_io_name).is_none() {
                return Err(Error::InvalidRevision(format!(
                    "input wiring '{}' matches no input",
                    wiring.workflow_io_name
                )));
            }
            validate_entry(wiring, &mut seen)?;
        }

        seen.clear();
        for wiring in &self.output_wirings {
            if interface.output(&wiring.workflow_io_name).is_none() {
                return Err(Error::InvalidRevision(format!(
                    "output wiring '{}' matches no output",
                    wiring.workflow_io_name
                )));
            }
            validate_entry(wiring, &mut seen)?;
        }

        Ok(())
    }
}

fn validate_entry<'a>(wiring: &'a IoWiring, seen: &mut HashSet<&'a str>) -> Result<()> {
    if !seen.insert(wiring.workflow_io_name.as_str()) {
        return Err(Error::InvalidRevision(format!(
            "'{}' is wired more than once",
            wiring.workflow_io_name
        )));
    }
    if !wiring.is_direct() && wiring.reference().is_none() {
        return Err(Error::InvalidRevision(format!(
            "wiring '{}' to adapter '{}' has neither ref_id nor ref_key",
            wiring.workflow_io_name, wiring.adapter_id
        )));
    }
    Ok(())
}
