//! Transformation revisions.
//!
//! A [`TransformationRevision`] is either a component (opaque code with a
//! typed interface) or a workflow (a graph of [`Operator`]s that instance
//! other revisions). Revisions are read-only to the engine.

mod content;
mod id;
mod io;
mod kind;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::content::{
    CodeContent, Connection, ConnectionBuilder, Endpoint, IoMapping, Operator, RevisionContent,
    WorkflowContent,
};
pub use self::id::OperatorId;
pub use self::io::{Input, InputKind, IoInterface, Output};
pub use self::kind::{RevisionKind, RevisionState};
use crate::error::{Error, Result};
use crate::wiring::Wiring;

/// Versioned definition of a component or a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationRevision {
    pub id: Uuid,
    pub revision_group_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub version_tag: String,
    #[serde(rename = "type")]
    pub kind: RevisionKind,
    pub state: RevisionState,
    pub io_interface: IoInterface,
    pub content: RevisionContent,
    #[serde(default)]
    pub documentation: String,
    /// Default bindings used when an execution supplies none.
    #[serde(default)]
    pub test_wiring: Wiring,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_wiring: Option<Wiring>,
}

impl TransformationRevision {
    /// Creates a draft component revision.
    pub fn component(
        id: Uuid,
        name: impl Into<String>,
        category: impl Into<String>,
        io_interface: IoInterface,
        code: CodeContent,
    ) -> Self {
        Self {
            id,
            revision_group_id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            category: category.into(),
            version_tag: "1.0.0".into(),
            kind: RevisionKind::Component,
            state: RevisionState::Draft,
            io_interface,
            content: RevisionContent::Code(code),
            documentation: String::new(),
            test_wiring: Wiring::default(),
            release_wiring: None,
        }
    }

    /// Creates a draft workflow revision.
    pub fn workflow(
        id: Uuid,
        name: impl Into<String>,
        category: impl Into<String>,
        io_interface: IoInterface,
        content: WorkflowContent,
    ) -> Self {
        Self {
            kind: RevisionKind::Workflow,
            content: RevisionContent::Workflow(content),
            ..Self::component(id, name, category, io_interface, CodeContent::placeholder())
        }
    }

    /// Sets the lifecycle state.
    #[must_use]
    pub fn with_state(mut self, state: RevisionState) -> Self {
        self.state = state;
        self
    }

    /// Sets the version tag.
    #[must_use]
    pub fn with_version_tag(mut self, version_tag: impl Into<String>) -> Self {
        self.version_tag = version_tag.into();
        self
    }

    /// Sets the default wiring.
    #[must_use]
    pub fn with_test_wiring(mut self, wiring: Wiring) -> Self {
        self.test_wiring = wiring;
        self
    }

    /// Returns `"{name} ({version_tag})"`.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.version_tag)
    }

    /// Returns the code body of a component.
    pub fn code(&self) -> Option<&CodeContent> {
        self.content.as_code()
    }

    /// Returns the operator graph of a workflow.
    pub fn workflow_content(&self) -> Option<&WorkflowContent> {
        self.content.as_workflow()
    }

    /// Checks interface uniqueness and that the content matches the kind.
    pub fn validate(&self) -> Result<()> {
        self.io_interface.validate()?;

        let consistent = matches!(
            (self.kind, &self.content),
            (RevisionKind::Component, RevisionContent::Code(_))
                | (RevisionKind::Workflow, RevisionContent::Workflow(_))
        );
        if !consistent {
            return Err(Error::InvalidRevision(format!(
                "revision {} is a {} but its content does not match",
                self.id, self.kind
            )));
        }

        Ok(())
    }

    /// Wraps a component into a workflow with a single operator instancing it.
    ///
    /// The workflow keeps the component's id, interface and default wiring.
    /// Every input and output is routed one-to-one to the operator.
    pub fn wrap_into_workflow(&self) -> Result<(TransformationRevision, OperatorId)> {
        if self.kind != RevisionKind::Component {
            return Err(Error::InvalidRevision(format!(
                "only components can be wrapped, {} is a {}",
                self.id, self.kind
            )));
        }

        let mut content = WorkflowContent::default();
        let operator_id = content.add_operator(self.id, &self.name);
        for input in &self.io_interface.inputs {
            content.expose_input(&input.name, Endpoint::new(operator_id, &input.name));
        }
        for output in &self.io_interface.outputs {
            content.expose_output(&output.name, Endpoint::new(operator_id, &output.name));
        }

        let workflow = TransformationRevision {
            kind: RevisionKind::Workflow,
            content: RevisionContent::Workflow(content),
            ..self.clone()
        };

        Ok((workflow, operator_id))
    }
}

impl CodeContent {
    /// Code placeholder for revisions that carry no code.
    fn placeholder() -> Self {
        Self {
            code_module_id: Uuid::nil(),
            function_name: String::new(),
            source: String::new(),
        }
    }
}
