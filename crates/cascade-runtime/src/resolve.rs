//! Binding resolution.
//!
//! Turns wiring entries into [`DispatchableBinding`]s and, for the component
//! adapter, turns a binding into a complete sub-execution.

use std::collections::HashMap;

use cascade_core::wiring::{IoWiring, DIRECT_PROVISIONING, VALUE_FILTER};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::adapter::component::{
    component_revision, derived_wiring, validate_component, ComponentAdapterConfig,
    UnknownFilter, ValidationError,
};
use crate::adapter::{BindingDescriptor, Direction};
use crate::assemble::ExecutionInputAssembler;
use crate::catalog::Catalog;
use crate::flatten::flatten;
use crate::payload::{Configuration, ExecutionInput};

/// A wiring entry ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchableBinding {
    /// Value passed through without I/O. `None` for outputs.
    Direct { value: Option<Value> },
    /// Binding handed to the adapter with this id.
    Adapter {
        adapter_id: String,
        descriptor: BindingDescriptor,
    },
}

/// Failure to resolve or prepare one binding.
#[derive(Debug, Error)]
pub enum BindingError {
    #[error("direct provisioning of '{0}' has no 'value' filter")]
    MissingValue(String),

    #[error("wiring of '{0}' has neither ref_id nor ref_key")]
    MissingReference(String),

    #[error("reference '{0}' is not a component id")]
    InvalidReference(String),

    #[error("ComponentRevision {0} NOT PRESENT")]
    ComponentNotPresent(Uuid),

    #[error("CODE MODULE {0} NOT PRESENT")]
    CodeModuleNotPresent(Uuid),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    UnknownFilter(#[from] UnknownFilter),

    #[error(transparent)]
    Pipeline(#[from] crate::Error),
}

/// Resolves one wiring entry for dispatch in `direction`.
pub fn resolve(wiring: &IoWiring, direction: Direction) -> Result<DispatchableBinding, BindingError> {
    if wiring.adapter_id == DIRECT_PROVISIONING {
        let value = match direction {
            Direction::Load => Some(
                wiring
                    .filters
                    .get(VALUE_FILTER)
                    .cloned()
                    .ok_or_else(|| BindingError::MissingValue(wiring.workflow_io_name.clone()))?,
            ),
            Direction::Send => None,
        };
        return Ok(DispatchableBinding::Direct { value });
    }

    if wiring.reference().is_none() {
        return Err(BindingError::MissingReference(wiring.workflow_io_name.clone()));
    }

    Ok(DispatchableBinding::Adapter {
        adapter_id: wiring.adapter_id.clone(),
        descriptor: BindingDescriptor::from(wiring),
    })
}

/// Prepares the sub-execution running a component as a source or sink.
///
/// The component must be present in `catalog` and suitable for `direction`.
/// It is regenerated, wrapped into a one-operator workflow and flattened
/// through the ordinary pipeline. Binding filters become direct-provisioned
/// inputs; for sinks `sink_value` is provisioned into `data` with the
/// binding's external type. Pure plot components run like any other.
pub fn component_execution(
    catalog: &Catalog,
    config: &ComponentAdapterConfig,
    direction: Direction,
    descriptor: &BindingDescriptor,
    sink_value: Option<&Value>,
) -> Result<ExecutionInput, BindingError> {
    let reference = descriptor.reference().unwrap_or_default();
    let component_id: Uuid = reference
        .parse()
        .map_err(|_| BindingError::InvalidReference(reference.to_owned()))?;

    let record = catalog
        .component(component_id)
        .ok_or(BindingError::ComponentNotPresent(component_id))?;
    let module = catalog
        .code_module(record.code_module_id)
        .ok_or(BindingError::CodeModuleNotPresent(record.code_module_id))?;

    validate_component(record.into(), config, direction, true)?;

    let revision = component_revision(record, module);
    let (workflow, operator_id) = revision.wrap_into_workflow().map_err(crate::Error::from)?;
    let closure = HashMap::from([(operator_id, revision)]);
    let node = flatten(&workflow, &closure)?;

    let sink = sink_value.map(|value| (value, descriptor.external_type));
    let wiring = derived_wiring(record, &descriptor.filters, sink)?;
    let configuration = Configuration {
        name: format!("{} as component {}", record.display_name(), direction.usage()),
        run_pure_plot_operators: true,
    };

    let input = ExecutionInputAssembler::new(workflow.id)
        .with_code_modules([module.clone()])
        .with_components([record.clone()])
        .with_wiring(Some(wiring))
        .with_configuration(configuration)
        .assemble(node)?;

    Ok(input)
}
