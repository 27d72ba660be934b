//! Components used as data sources and sinks.
//!
//! A binding of the component adapter references a component by id. Loading
//! runs the component with the binding filters as inputs and returns its only
//! output. Sending runs it with the sent value as its `data` input.

mod config;
mod structure;
mod synthetic;
mod validate;

use std::collections::BTreeMap;

use cascade_core::wiring::COMPONENT_ADAPTER;
use serde_json::Value;

pub use self::config::ComponentAdapterConfig;
pub use self::structure::{
    ComponentAdapterStructure, StructureEntry, StructureFilter, StructureListing, ThingNode,
};
pub use self::synthetic::{
    component_revision, derived_wiring, UnknownFilter, SYNTHETIC_REVISION_GROUP_ID,
};
pub use self::validate::{validate_component, ComponentProfile, ValidationError, SINK_DATA_INPUT};
use super::{Adapter, AdapterContext, BindingDescriptor, Direction};
use crate::dispatch::settle;
use crate::error::{AdapterError, BindingFailure};
use crate::resolve::component_execution;

/// Tracing target for the component adapter.
const TRACING_TARGET: &str = "cascade_runtime::adapter::component";

/// Adapter running components as sources and sinks.
#[derive(Debug, Clone, Default)]
pub struct ComponentAdapter {
    config: ComponentAdapterConfig,
}

impl ComponentAdapter {
    pub fn new(config: ComponentAdapterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ComponentAdapterConfig {
        &self.config
    }

    /// Runs one binding and returns the value of the source, or null for
    /// sinks.
    async fn run_binding(
        &self,
        ctx: &AdapterContext<'_>,
        direction: Direction,
        descriptor: &BindingDescriptor,
        sink_value: Option<&Value>,
    ) -> Result<Value, BindingFailure> {
        let failure = |message: String| BindingFailure {
            message,
            descriptor: Some(descriptor.clone()),
        };

        let input = component_execution(ctx.catalog(), &self.config, direction, descriptor, sink_value)
            .map_err(|err| failure(err.to_string()))?;
        let output_name = input
            .workflow
            .interface()
            .outputs
            .first()
            .map(|output| output.name.clone());

        tracing::debug!(
            target: TRACING_TARGET,
            %direction,
            root_id = %input.root_id,
            job_id = %input.job_id,
            "Running component sub-execution"
        );

        let mut result = ctx
            .executor()
            .run(input)
            .await
            .map_err(|err| failure(err.to_string()))?;
        if let Some(error) = result.error.take() {
            return Err(failure(error));
        }

        match (direction, output_name) {
            (Direction::Load, Some(name)) => result
                .output_results_by_output_name
                .remove(&name)
                .ok_or_else(|| failure(format!("component source produced no output '{name}'"))),
            _ => Ok(Value::Null),
        }
    }
}

#[async_trait::async_trait]
impl Adapter for ComponentAdapter {
    fn id(&self) -> &str {
        COMPONENT_ADAPTER
    }

    async fn load(
        &self,
        ctx: &AdapterContext<'_>,
        bindings: &BTreeMap<String, BindingDescriptor>,
    ) -> Result<BTreeMap<String, Value>, AdapterError> {
        let units = bindings.iter().map(|(name, descriptor)| {
            let unit = self.run_binding(ctx, Direction::Load, descriptor, None);
            (name.clone(), unit)
        });

        settle(Direction::Load, units).await
    }

    async fn send(
        &self,
        ctx: &AdapterContext<'_>,
        bindings: &BTreeMap<String, BindingDescriptor>,
        values: &BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, AdapterError> {
        let units = bindings.iter().map(|(name, descriptor)| {
            let unit = async move {
                let Some(value) = values.get(name) else {
                    return Err(BindingFailure {
                        message: format!("no value to send for '{name}'"),
                        descriptor: Some(descriptor.clone()),
                    });
                };
                self.run_binding(ctx, Direction::Send, descriptor, Some(value))
                    .await
            };
            (name.clone(), unit)
        });

        settle(Direction::Send, units).await?;
        Ok(BTreeMap::new())
    }
}
