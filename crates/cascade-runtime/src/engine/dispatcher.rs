//! Selection between in-process and remote execution.

use cascade_core::Timing;
use jiff::Timestamp;

use super::TRACING_TARGET;
use crate::error::Result;
use crate::executor::LocalExecutor;
use crate::payload::{ExecutionInput, ExecutionResult, MeasuredStep};
use crate::remote::RemoteRuntimeClient;

/// Where execution inputs run.
#[derive(Debug, Clone)]
pub enum ExecutionMode {
    /// This process is the terminal executor.
    Local(LocalExecutor),
    /// Inputs are posted to a remote runtime.
    Remote(RemoteRuntimeClient),
}

/// Runs execution inputs in the configured [`ExecutionMode`].
#[derive(Debug, Clone)]
pub struct ExecutionDispatcher {
    mode: ExecutionMode,
}

impl ExecutionDispatcher {
    pub fn new(mode: ExecutionMode) -> Self {
        Self { mode }
    }

    pub fn local(executor: LocalExecutor) -> Self {
        Self::new(ExecutionMode::Local(executor))
    }

    pub fn remote(client: RemoteRuntimeClient) -> Self {
        Self::new(ExecutionMode::Remote(client))
    }

    pub fn mode(&self) -> &ExecutionMode {
        &self.mode
    }

    /// Runs `input` and records the `run_execution_input` step.
    ///
    /// Nothing is retried.
    pub async fn run(&self, input: ExecutionInput) -> Result<ExecutionResult> {
        let start = Timestamp::now();
        let job_id = input.job_id;

        let mut result = match &self.mode {
            ExecutionMode::Local(executor) => executor.run(input).await?,
            ExecutionMode::Remote(client) => client.run(&input).await?,
        };

        let timing = Timing::since(start);
        result
            .measured_steps
            .record(MeasuredStep::RunExecutionInput.as_ref(), timing);

        tracing::debug!(
            target: TRACING_TARGET,
            %job_id,
            remote = matches!(self.mode, ExecutionMode::Remote(_)),
            duration_ms = timing.duration.as_millis(),
            "Ran execution input"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::adapter::AdapterRegistry;
    use crate::fixtures;

    #[tokio::test]
    async fn test_local_run_records_timing() {
        let executor = LocalExecutor::new(AdapterRegistry::new(), fixtures::bodies());
        let dispatcher = ExecutionDispatcher::local(executor);

        let result = dispatcher.run(fixtures::execution_input()).await.unwrap();
        assert_eq!(result.output_results_by_output_name["y"], json!(10));
        assert!(result
            .measured_steps
            .get(MeasuredStep::RunExecutionInput.as_ref())
            .is_some());
    }
}
