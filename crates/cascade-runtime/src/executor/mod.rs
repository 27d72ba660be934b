//! In-process execution of an [`ExecutionInput`].

mod body;
mod graph;

use std::collections::BTreeMap;
use std::sync::Arc;

use cascade_core::{MeasuredSteps, Timing};
use jiff::Timestamp;

pub use self::body::{BodyCall, BodyRegistry, ComponentBody, PassThrough, PASS_THROUGH};
pub use self::graph::{GraphRunner, NodeFailure};
use crate::adapter::{AdapterContext, AdapterRegistry};
use crate::catalog::Catalog;
use crate::dispatch::AdapterDispatcher;
use crate::error::Result;
use crate::payload::{ExecutionInput, ExecutionResult, MeasuredStep};

/// Tracing target for local execution.
const TRACING_TARGET: &str = "cascade_runtime::executor";

/// Runs execution inputs in this process.
///
/// Cheap to clone. Adapters that start sub-executions, like the component
/// adapter, run them on the same executor.
#[derive(Debug, Clone, Default)]
pub struct LocalExecutor {
    inner: Arc<LocalExecutorInner>,
}

#[derive(Debug, Default)]
struct LocalExecutorInner {
    adapters: AdapterRegistry,
    bodies: BodyRegistry,
}

impl LocalExecutor {
    /// Creates an executor with the given adapters and component bodies.
    pub fn new(adapters: AdapterRegistry, bodies: BodyRegistry) -> Self {
        Self {
            inner: Arc::new(LocalExecutorInner { adapters, bodies }),
        }
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.inner.adapters
    }

    pub fn bodies(&self) -> &BodyRegistry {
        &self.inner.bodies
    }

    /// Loads wired inputs, runs the graph and sends wired outputs.
    ///
    /// Invalid inputs and failed fan-outs are errors. A failure of the graph
    /// itself is reported inside the returned result. Outputs that are wired
    /// to direct provisioning, or not wired at all, are returned in the
    /// result; all others are sent and omitted.
    pub async fn run(&self, input: ExecutionInput) -> Result<ExecutionResult> {
        input.validate()?;

        let catalog = Catalog::from_input(&input);
        let ctx = AdapterContext::new(&catalog, self);
        let dispatcher = AdapterDispatcher::new(&self.inner.adapters, ctx);
        let mut steps = MeasuredSteps::new();

        let start = Timestamp::now();
        let inputs = dispatcher.load(&input.workflow_wiring.input_wirings).await?;
        steps.record(MeasuredStep::LoadInputs.as_ref(), Timing::since(start));

        let start = Timestamp::now();
        let runner = GraphRunner::new(
            &self.inner.bodies,
            input.configuration.run_pure_plot_operators,
        );
        let outcome = runner.run(&input.workflow, inputs);
        steps.record(MeasuredStep::RunGraph.as_ref(), Timing::since(start));

        let mut outputs = match outcome {
            Ok(outputs) => outputs,
            Err(failure) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    job_id = %input.job_id,
                    error = %failure,
                    "Execution failed"
                );
                let mut result = ExecutionResult::failure(input.job_id, failure.to_string());
                result.measured_steps = steps;
                return Ok(result);
            }
        };

        let (direct, sent): (Vec<_>, Vec<_>) = input
            .workflow_wiring
            .output_wirings
            .iter()
            .partition(|wiring| wiring.is_direct());
        let sent: Vec<_> = sent.into_iter().cloned().collect();
        let sent_values: BTreeMap<_, _> = sent
            .iter()
            .filter_map(|wiring| {
                let name = &wiring.workflow_io_name;
                outputs.remove(name).map(|value| (name.clone(), value))
            })
            .collect();

        let start = Timestamp::now();
        dispatcher.send(&sent, &sent_values).await?;
        steps.record(MeasuredStep::SendOutputs.as_ref(), Timing::since(start));

        tracing::debug!(
            target: TRACING_TARGET,
            job_id = %input.job_id,
            direct_outputs = direct.len(),
            sent_outputs = sent.len(),
            "Execution finished"
        );

        let mut result = ExecutionResult::ok(input.job_id, outputs);
        result.measured_steps = steps;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use cascade_core::revision::RevisionState;
    use cascade_core::wiring::{IoWiring, Wiring, COMPONENT_ADAPTER};
    use serde_json::json;

    use super::*;
    use crate::adapter::component::{ComponentAdapter, ComponentAdapterConfig};
    use crate::error::Error;
    use crate::fixtures;

    fn executor() -> LocalExecutor {
        LocalExecutor::new(
            AdapterRegistry::new().with_adapter(ComponentAdapter::new(
                ComponentAdapterConfig::default().with_draft_components(true),
            )),
            fixtures::bodies(),
        )
    }

    #[tokio::test]
    async fn test_direct_provisioning_end_to_end() {
        let input = fixtures::execution_input();
        let job_id = input.job_id;

        let result = executor().run(input).await.unwrap();
        assert!(result.is_ok());
        assert_eq!(result.error, None);
        assert_eq!(result.job_id, job_id);
        assert_eq!(result.output_results_by_output_name["y"], json!(10));
        for step in [MeasuredStep::LoadInputs, MeasuredStep::RunGraph, MeasuredStep::SendOutputs] {
            assert!(result.measured_steps.get(step.as_ref()).is_some());
        }
    }

    #[tokio::test]
    async fn test_graph_failure_is_reported_in_result() {
        let mut input = fixtures::execution_input();
        input.workflow_wiring = Wiring::new(vec![IoWiring::direct("x", json!("nope"))], vec![]);

        let result = executor().run(input).await.unwrap();
        assert!(!result.is_ok());
        assert!(result.error.unwrap().contains("invalid"));
    }

    #[tokio::test]
    async fn test_invalid_input_is_an_error() {
        let mut input = fixtures::execution_input();
        input.code_modules.clear();

        let err = executor().run(input).await.unwrap_err();
        assert!(matches!(err, Error::InputValidation(_)));
    }

    #[tokio::test]
    async fn test_component_source_and_sink() {
        let source = fixtures::doubler(2).with_state(RevisionState::Released);
        let sink = fixtures::sink(3).with_state(RevisionState::Released);

        let mut input = fixtures::execution_input();
        let extra = fixtures::catalog([&source, &sink]);
        input.code_modules.extend(extra.code_modules().cloned());
        input.components.extend(extra.components().cloned());
        input.workflow_wiring = Wiring::new(
            vec![IoWiring::new("x", COMPONENT_ADAPTER)
                .with_ref_id(source.id.to_string())
                .with_filter("x", json!(7))],
            vec![IoWiring::new("y", COMPONENT_ADAPTER).with_ref_id(sink.id.to_string())],
        );

        let result = executor().run(input).await.unwrap();
        assert!(result.is_ok(), "{:?}", result.error);
        assert!(result.output_results_by_output_name.is_empty());
    }

    #[tokio::test]
    async fn test_failed_fan_out_is_an_error() {
        let mut input = fixtures::execution_input();
        input.workflow_wiring = Wiring::new(
            vec![IoWiring::new("x", COMPONENT_ADAPTER).with_ref_id(uuid::Uuid::nil().to_string())],
            vec![],
        );

        let err = executor().run(input).await.unwrap_err();
        let Error::AdapterHandling(err) = err else {
            panic!("expected an adapter handling error, got {err}");
        };
        assert!(err.failures()["x"].message.contains("NOT PRESENT"));
    }
}
