//! Execution input assembly.

use std::collections::BTreeMap;

use cascade_core::revision::TransformationRevision;
use cascade_core::wiring::Wiring;
use uuid::Uuid;

use crate::error::Result;
use crate::flatten::FlattenedNode;
use crate::payload::{CodeModule, ComponentRecord, Configuration, ExecutionInput};

/// Tracing target for assembly.
const TRACING_TARGET: &str = "cascade_runtime::assemble";

/// Collects the artifacts of one execution and builds its [`ExecutionInput`].
///
/// Code modules and component records are keyed by id: adding the same one
/// twice, whether through the main graph or an adapter sub-graph, keeps a
/// single copy.
#[derive(Debug, Clone)]
pub struct ExecutionInputAssembler {
    root_id: Uuid,
    code_modules: BTreeMap<Uuid, CodeModule>,
    components: BTreeMap<Uuid, ComponentRecord>,
    wiring: Option<Wiring>,
    default_wiring: Wiring,
    configuration: Option<Configuration>,
    job_id: Option<Uuid>,
}

impl ExecutionInputAssembler {
    /// Starts an assembly for the revision with `root_id`.
    pub fn new(root_id: Uuid) -> Self {
        Self {
            root_id,
            code_modules: BTreeMap::new(),
            components: BTreeMap::new(),
            wiring: None,
            default_wiring: Wiring::default(),
            configuration: None,
            job_id: None,
        }
    }

    /// Adds the artifacts of every component revision. Workflows are skipped.
    #[must_use]
    pub fn with_revisions<'a>(
        self,
        revisions: impl IntoIterator<Item = &'a TransformationRevision>,
    ) -> Self {
        let (modules, records): (Vec<_>, Vec<_>) = revisions
            .into_iter()
            .filter_map(|revision| {
                Some((
                    CodeModule::from_revision(revision)?,
                    ComponentRecord::from_revision(revision)?,
                ))
            })
            .unzip();

        self.with_code_modules(modules).with_components(records)
    }

    #[must_use]
    pub fn with_code_modules(mut self, modules: impl IntoIterator<Item = CodeModule>) -> Self {
        for module in modules {
            self.code_modules.entry(module.id).or_insert(module);
        }
        self
    }

    #[must_use]
    pub fn with_components(mut self, components: impl IntoIterator<Item = ComponentRecord>) -> Self {
        for component in components {
            self.components.entry(component.id).or_insert(component);
        }
        self
    }

    /// Sets the explicit wiring. `None` falls back to the default wiring.
    #[must_use]
    pub fn with_wiring(mut self, wiring: Option<Wiring>) -> Self {
        self.wiring = wiring;
        self
    }

    /// Sets the wiring used when no explicit one is given.
    #[must_use]
    pub fn with_default_wiring(mut self, wiring: Wiring) -> Self {
        self.default_wiring = wiring;
        self
    }

    #[must_use]
    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    #[must_use]
    pub fn with_job_id(mut self, job_id: Uuid) -> Self {
        self.job_id = Some(job_id);
        self
    }

    /// Builds and validates the execution input for `workflow`.
    pub fn assemble(self, workflow: FlattenedNode) -> Result<ExecutionInput> {
        let configuration = self.configuration.unwrap_or_else(|| Configuration {
            name: self.root_id.to_string(),
            run_pure_plot_operators: false,
        });

        let input = ExecutionInput {
            code_modules: self.code_modules.into_values().collect(),
            components: self.components.into_values().collect(),
            workflow,
            configuration,
            workflow_wiring: self.wiring.unwrap_or(self.default_wiring),
            job_id: self.job_id.unwrap_or_else(Uuid::new_v4),
            root_id: self.root_id,
        };

        input.validate()?;

        tracing::debug!(
            target: TRACING_TARGET,
            root_id = %input.root_id,
            job_id = %input.job_id,
            code_modules = input.code_modules.len(),
            components = input.components.len(),
            "Assembled execution input"
        );

        Ok(input)
    }
}
