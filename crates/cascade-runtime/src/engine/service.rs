//! The execution pipeline on top of a revision store.

use std::sync::Arc;

use cascade_core::revision::TransformationRevision;
use cascade_core::store::RevisionStore;
use cascade_core::wiring::{IoWiring, Wiring, COMPONENT_ADAPTER};
use cascade_core::Timing;
use jiff::Timestamp;
use tokio::sync::Semaphore;
use uuid::Uuid;

use super::{EngineConfig, ExecutionDispatcher, TRACING_TARGET};
use crate::adapter::component::{validate_component, ComponentAdapter, ComponentAdapterConfig};
use crate::adapter::{AdapterRegistry, Direction};
use crate::assemble::ExecutionInputAssembler;
use crate::error::{Error, Result};
use crate::executor::{BodyRegistry, LocalExecutor};
use crate::flatten::flatten;
use crate::payload::{Configuration, ExecutionInput, ExecutionResult, MeasuredStep};

/// Request to execute one stored revision.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    pub revision_id: Uuid,
    /// Wiring to use instead of the revision's default wiring.
    pub wiring: Option<Wiring>,
    pub job_id: Uuid,
    /// Overrides [`EngineConfig::run_pure_plot_operators`].
    pub run_pure_plot_operators: Option<bool>,
}

impl ExecutionRequest {
    /// Creates a request with the default wiring and a random job id.
    pub fn new(revision_id: Uuid) -> Self {
        Self {
            revision_id,
            wiring: None,
            job_id: Uuid::new_v4(),
            run_pure_plot_operators: None,
        }
    }

    #[must_use]
    pub fn with_wiring(mut self, wiring: Wiring) -> Self {
        self.wiring = Some(wiring);
        self
    }

    #[must_use]
    pub fn with_job_id(mut self, job_id: Uuid) -> Self {
        self.job_id = job_id;
        self
    }

    #[must_use]
    pub fn with_run_pure_plot_operators(mut self, run: bool) -> Self {
        self.run_pure_plot_operators = Some(run);
        self
    }
}

struct EngineInner {
    config: EngineConfig,
    adapter_config: ComponentAdapterConfig,
    store: Arc<dyn RevisionStore>,
    dispatcher: ExecutionDispatcher,
    permits: Semaphore,
}

/// Prepares and runs executions of stored revisions.
///
/// Cheap to clone. At most `max_concurrent_executions` executions run at the
/// same time; further calls wait for a free slot.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.inner.config)
            .field("adapter_config", &self.inner.adapter_config)
            .field("dispatcher", &self.inner.dispatcher)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Creates an engine dispatching through `dispatcher`.
    pub fn new(
        config: EngineConfig,
        adapter_config: ComponentAdapterConfig,
        store: Arc<dyn RevisionStore>,
        dispatcher: ExecutionDispatcher,
    ) -> Self {
        let permits = Semaphore::new(config.max_concurrent_executions.max(1));
        Self {
            inner: Arc::new(EngineInner {
                config,
                adapter_config,
                store,
                dispatcher,
                permits,
            }),
        }
    }

    /// Creates an engine executing in process with `bodies`.
    ///
    /// The component adapter is registered unless it is inactive.
    pub fn local(
        config: EngineConfig,
        adapter_config: ComponentAdapterConfig,
        store: Arc<dyn RevisionStore>,
        bodies: BodyRegistry,
    ) -> Self {
        let mut adapters = AdapterRegistry::new();
        if adapter_config.active {
            adapters.register(ComponentAdapter::new(adapter_config.clone()));
        }

        let executor = LocalExecutor::new(adapters, bodies);
        Self::new(config, adapter_config, store, ExecutionDispatcher::local(executor))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn adapter_config(&self) -> &ComponentAdapterConfig {
        &self.inner.adapter_config
    }

    pub fn store(&self) -> &Arc<dyn RevisionStore> {
        &self.inner.store
    }

    pub fn dispatcher(&self) -> &ExecutionDispatcher {
        &self.inner.dispatcher
    }

    /// Builds the validated execution input of a request.
    ///
    /// Fetches the revision and its nested closure, flattens it, fetches the
    /// components referenced through the component adapter and assembles
    /// everything into one payload.
    pub async fn prepare(&self, request: &ExecutionRequest) -> Result<ExecutionInput> {
        let store = &self.inner.store;
        let revision = store.get(request.revision_id).await?;
        revision
            .validate()
            .map_err(|err| Error::InputValidation(err.to_string()))?;

        let closure = store.nested_closure(&revision).await?;
        let workflow = flatten(&revision, &closure)?;

        let wiring = request.wiring.as_ref().unwrap_or(&revision.test_wiring);
        let adapter_components = self.component_adapter_revisions(wiring).await?;

        let configuration = Configuration {
            name: revision.display_name(),
            run_pure_plot_operators: request
                .run_pure_plot_operators
                .unwrap_or(self.inner.config.run_pure_plot_operators),
        };

        ExecutionInputAssembler::new(revision.id)
            .with_revisions([&revision])
            .with_revisions(closure.values())
            .with_revisions(adapter_components.iter())
            .with_wiring(request.wiring.clone())
            .with_default_wiring(revision.test_wiring.clone())
            .with_configuration(configuration)
            .with_job_id(request.job_id)
            .assemble(workflow)
    }

    /// Prepares and runs a request.
    ///
    /// Records `prepare_execution_input` and `internal_full` next to the
    /// steps of the dispatcher.
    pub async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult> {
        let _permit = self
            .inner
            .permits
            .acquire()
            .await
            .map_err(|err| Error::Internal(err.to_string()))?;

        tracing::info!(
            target: TRACING_TARGET,
            revision_id = %request.revision_id,
            job_id = %request.job_id,
            "Execution started"
        );

        let full_start = Timestamp::now();
        let input = self.prepare(&request).await?;
        let prepared = Timing::since(full_start);
        let interface = input.workflow.interface().clone();

        let mut result = self
            .inner
            .dispatcher
            .run(input)
            .await?
            .with_output_types(&interface);

        result
            .measured_steps
            .record(MeasuredStep::PrepareExecutionInput.as_ref(), prepared);
        result
            .measured_steps
            .record(MeasuredStep::InternalFull.as_ref(), Timing::since(full_start));

        tracing::info!(
            target: TRACING_TARGET,
            revision_id = %request.revision_id,
            job_id = %request.job_id,
            status = %result.result,
            "Execution finished"
        );

        Ok(result)
    }

    /// Fetches and validates every component bound through the component
    /// adapter.
    async fn component_adapter_revisions(
        &self,
        wiring: &Wiring,
    ) -> Result<Vec<TransformationRevision>> {
        let bound: Vec<(&IoWiring, Direction)> = wiring
            .input_wirings
            .iter()
            .map(|entry| (entry, Direction::Load))
            .chain(wiring.output_wirings.iter().map(|entry| (entry, Direction::Send)))
            .filter(|(entry, _)| entry.adapter_id == COMPONENT_ADAPTER)
            .collect();

        if bound.is_empty() {
            return Ok(Vec::new());
        }

        let config = &self.inner.adapter_config;
        if !config.active {
            return Err(Error::ComponentsNotFound(
                "wiring uses the component adapter but it is not active".into(),
            ));
        }

        let mut revisions = Vec::with_capacity(bound.len());
        for (entry, direction) in bound {
            let reference = entry.reference().unwrap_or_default();
            let id: Uuid = reference.parse().map_err(|_| {
                Error::ComponentsNotFound(format!(
                    "'{reference}' wired to '{}' is not a component id",
                    entry.workflow_io_name
                ))
            })?;

            let revision = self.inner.store.get(id).await.map_err(|err| {
                Error::ComponentsNotFound(format!(
                    "component {id} wired to '{}' could not be loaded: {err}",
                    entry.workflow_io_name
                ))
            })?;
            validate_component((&revision).into(), config, direction, true)
                .map_err(|err| Error::ComponentsNotFound(err.to_string()))?;

            revisions.push(revision);
        }

        tracing::debug!(
            target: TRACING_TARGET,
            count = revisions.len(),
            "Fetched component adapter components"
        );

        Ok(revisions)
    }
}
