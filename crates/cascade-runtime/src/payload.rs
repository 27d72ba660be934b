//! Execution payload and result shapes.

use std::collections::{BTreeMap, HashMap, HashSet};

use cascade_core::revision::{IoInterface, RevisionKind, RevisionState, TransformationRevision};
use cascade_core::types::DataType;
use cascade_core::wiring::Wiring;
use cascade_core::MeasuredSteps;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, IntoStaticStr};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::flatten::FlattenedNode;

/// Source text of one component body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeModule {
    pub id: Uuid,
    pub code: String,
}

impl CodeModule {
    /// Extracts the code module of a component revision.
    pub fn from_revision(revision: &TransformationRevision) -> Option<Self> {
        revision.code().map(|code| Self {
            id: code.code_module_id,
            code: code.source.clone(),
        })
    }
}

/// Interface record of one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub id: Uuid,
    pub name: String,
    pub version_tag: String,
    pub category: String,
    pub state: RevisionState,
    pub interface: IoInterface,
    pub code_module_id: Uuid,
    pub function_name: String,
}

impl ComponentRecord {
    /// Extracts the record of a component revision.
    pub fn from_revision(revision: &TransformationRevision) -> Option<Self> {
        if revision.kind != RevisionKind::Component {
            return None;
        }

        revision.code().map(|code| Self {
            id: revision.id,
            name: revision.name.clone(),
            version_tag: revision.version_tag.clone(),
            category: revision.category.clone(),
            state: revision.state,
            interface: revision.io_interface.clone(),
            code_module_id: code.code_module_id,
            function_name: code.function_name.clone(),
        })
    }

    /// Returns `"{name} ({version_tag})"`.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.version_tag)
    }
}

/// Behavioral flags of one execution.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Configuration {
    /// Name used in logs, usually the root revision id.
    pub name: String,
    /// Whether components producing only plots are run.
    #[serde(default)]
    pub run_pure_plot_operators: bool,
}

/// Self-contained unit handed to an executor.
///
/// Holds everything needed to run the flattened graph: every code module and
/// component record it references, exactly once each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionInput {
    pub code_modules: Vec<CodeModule>,
    pub components: Vec<ComponentRecord>,
    pub workflow: FlattenedNode,
    pub configuration: Configuration,
    pub workflow_wiring: Wiring,
    pub job_id: Uuid,
    /// Id of the originally requested revision.
    pub root_id: Uuid,
}

impl ExecutionInput {
    /// Checks the closure and identity invariants of the payload.
    ///
    /// Every component node needs a component record with a matching code
    /// module, ids must be unique, and the wiring must fit the root interface.
    pub fn validate(&self) -> Result<()> {
        let mut code_module_ids = HashSet::new();
        for module in &self.code_modules {
            if !code_module_ids.insert(module.id) {
                return Err(Error::InputValidation(format!(
                    "code module {} is contained more than once",
                    module.id
                )));
            }
        }

        let mut components = HashMap::new();
        for component in &self.components {
            if components.insert(component.id, component).is_some() {
                return Err(Error::InputValidation(format!(
                    "component {} is contained more than once",
                    component.id
                )));
            }
            if !code_module_ids.contains(&component.code_module_id) {
                return Err(Error::InputValidation(format!(
                    "code module {} of component {} is missing",
                    component.code_module_id, component.id
                )));
            }
        }

        for node in self.workflow.component_nodes() {
            let Some(record) = components.get(&node.component_id) else {
                return Err(Error::InputValidation(format!(
                    "component {} of node {} ({}) is missing",
                    node.component_id, node.name, node.id
                )));
            };
            if record.code_module_id != node.code_module_id {
                return Err(Error::InputValidation(format!(
                    "node {} ({}) expects code module {} but component {} has {}",
                    node.name, node.id, node.code_module_id, record.id, record.code_module_id
                )));
            }
        }

        self.workflow_wiring
            .validate(self.workflow.interface())
            .map_err(|err| Error::InputValidation(err.to_string()))
    }
}

/// Phases whose timings are reported in [`ExecutionResult::measured_steps`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum MeasuredStep {
    PrepareExecutionInput,
    RunExecutionInput,
    InternalFull,
    LoadInputs,
    RunGraph,
    SendOutputs,
}

/// Outcome flag of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExecutionStatus {
    #[default]
    Ok,
    Failure,
}

/// Result of running an [`ExecutionInput`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(default)]
    pub result: ExecutionStatus,
    /// Values of outputs that were not sent to an adapter.
    #[serde(default)]
    pub output_results_by_output_name: BTreeMap<String, Value>,
    #[serde(default)]
    pub output_types_by_output_name: BTreeMap<String, DataType>,
    /// Failure of the executed logic, reported verbatim.
    #[serde(default)]
    pub error: Option<String>,
    pub job_id: Uuid,
    #[serde(default)]
    pub measured_steps: MeasuredSteps,
}

impl ExecutionResult {
    /// Creates a successful result.
    pub fn ok(job_id: Uuid, outputs: BTreeMap<String, Value>) -> Self {
        Self {
            result: ExecutionStatus::Ok,
            output_results_by_output_name: outputs,
            output_types_by_output_name: BTreeMap::new(),
            error: None,
            job_id,
            measured_steps: MeasuredSteps::new(),
        }
    }

    /// Creates a failed result.
    pub fn failure(job_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            result: ExecutionStatus::Failure,
            error: Some(error.into()),
            ..Self::ok(job_id, BTreeMap::new())
        }
    }

    /// Returns true if the execution succeeded.
    pub fn is_ok(&self) -> bool {
        self.result == ExecutionStatus::Ok && self.error.is_none()
    }

    /// Fills the output types from the root interface.
    pub fn with_output_types(mut self, interface: &IoInterface) -> Self {
        self.output_types_by_output_name = interface
            .outputs
            .iter()
            .map(|output| (output.name.clone(), output.data_type))
            .collect();
        self
    }
}

/// Version information of a runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeInfo {
    pub version: semver::Version,
}

/// Returns the version information of this runtime.
pub fn runtime_info() -> RuntimeInfo {
    RuntimeInfo {
        version: semver::Version::parse(env!("CARGO_PKG_VERSION"))
            .unwrap_or_else(|_| semver::Version::new(0, 0, 0)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::fixtures;

    #[test]
    fn test_failure_result_shape() {
        let result = ExecutionResult::failure(Uuid::from_u128(1), "boom");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["result"], "failure");
        assert_eq!(json["error"], "boom");
        assert_eq!(json["output_results_by_output_name"], json!({}));
        assert!(!result.is_ok());
    }

    #[test]
    fn test_validate_detects_missing_component() {
        let mut input = fixtures::execution_input();
        input.components.clear();

        let err = input.validate().unwrap_err();
        assert!(matches!(err, Error::InputValidation(_)));
    }

    #[test]
    fn test_validate_detects_missing_code_module() {
        let mut input = fixtures::execution_input();
        input.code_modules.clear();

        assert!(matches!(input.validate(), Err(Error::InputValidation(_))));
    }

    #[test]
    fn test_validate_detects_duplicates() {
        let mut input = fixtures::execution_input();
        let duplicate = input.components[0].clone();
        input.components.push(duplicate);

        assert!(matches!(input.validate(), Err(Error::InputValidation(_))));
    }

    #[test]
    fn test_measured_step_names() {
        assert_eq!(MeasuredStep::PrepareExecutionInput.as_ref(), "prepare_execution_input");
        assert_eq!(MeasuredStep::SendOutputs.to_string(), "send_outputs");
    }

    #[test]
    fn test_runtime_info_has_crate_version() {
        assert_eq!(runtime_info().version.to_string(), env!("CARGO_PKG_VERSION"));
    }
}
