//! Revision bodies: component code or workflow graph.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OperatorId;
use crate::error::{Error, Result};

/// Body of a revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RevisionContent {
    /// Opaque executable code of a component.
    Code(CodeContent),
    /// Operator graph of a workflow.
    Workflow(WorkflowContent),
}

impl RevisionContent {
    /// Returns the code body, if any.
    pub fn as_code(&self) -> Option<&CodeContent> {
        match self {
            Self::Code(code) => Some(code),
            Self::Workflow(_) => None,
        }
    }

    /// Returns the workflow graph, if any.
    pub fn as_workflow(&self) -> Option<&WorkflowContent> {
        match self {
            Self::Workflow(workflow) => Some(workflow),
            Self::Code(_) => None,
        }
    }
}

/// Executable code of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeContent {
    /// Identity of the code module holding the source.
    pub code_module_id: Uuid,
    /// Entry point inside the module.
    pub function_name: String,
    /// Source text, never interpreted by the engine itself.
    #[serde(default)]
    pub source: String,
}

/// Operator instance inside a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    /// Revision this operator instantiates.
    pub revision_id: Uuid,
    pub name: String,
}

/// Named connector of one operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub operator_id: OperatorId,
    pub connector: String,
}

impl Endpoint {
    /// Creates an endpoint.
    pub fn new(operator_id: OperatorId, connector: impl Into<String>) -> Self {
        Self {
            operator_id,
            connector: connector.into(),
        }
    }
}

/// Link from an operator output to an operator input.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(pattern = "owned", setter(into), build_fn(validate = "Self::validate"))]
pub struct Connection {
    pub from: Endpoint,
    pub to: Endpoint,
}

impl ConnectionBuilder {
    fn validate(&self) -> Result<(), String> {
        if let (Some(from), Some(to)) = (&self.from, &self.to)
            && from.operator_id == to.operator_id
        {
            return Err(format!("operator {} cannot connect to itself", from.operator_id));
        }
        Ok(())
    }
}

/// Routes one workflow-level input or output to an operator connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoMapping {
    /// Name on the workflow interface.
    pub name: String,
    pub endpoint: Endpoint,
}

impl IoMapping {
    /// Creates a mapping.
    pub fn new(name: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            name: name.into(),
            endpoint,
        }
    }
}

/// Operator graph of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkflowContent {
    #[serde(default)]
    pub operators: Vec<Operator>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Workflow inputs routed to operator inputs.
    #[serde(default)]
    pub inputs: Vec<IoMapping>,
    /// Operator outputs exposed as workflow outputs.
    #[serde(default)]
    pub outputs: Vec<IoMapping>,
}

impl WorkflowContent {
    /// Adds an operator instancing `revision_id` and returns its id.
    pub fn add_operator(&mut self, revision_id: Uuid, name: impl Into<String>) -> OperatorId {
        let id = OperatorId::new();
        self.operators.push(Operator {
            id,
            revision_id,
            name: name.into(),
        });
        id
    }

    /// Connects an operator output to another operator input.
    ///
    /// Both operators must already be part of the workflow and must differ.
    pub fn connect(&mut self, from: Endpoint, to: Endpoint) -> Result<&mut Self> {
        for endpoint in [&from, &to] {
            if self.operator(endpoint.operator_id).is_none() {
                return Err(Error::InvalidRevision(format!(
                    "connection endpoint {}.{} references an unknown operator",
                    endpoint.operator_id, endpoint.connector
                )));
            }
        }

        let connection = ConnectionBuilder::default()
            .from(from)
            .to(to)
            .build()
            .map_err(|err| Error::InvalidRevision(err.to_string()))?;
        self.connections.push(connection);
        Ok(self)
    }

    /// Exposes an operator input as a workflow input.
    pub fn expose_input(&mut self, name: impl Into<String>, endpoint: Endpoint) -> &mut Self {
        self.inputs.push(IoMapping::new(name, endpoint));
        self
    }

    /// Exposes an operator output as a workflow output.
    pub fn expose_output(&mut self, name: impl Into<String>, endpoint: Endpoint) -> &mut Self {
        self.outputs.push(IoMapping::new(name, endpoint));
        self
    }

    /// Looks up an operator by id.
    pub fn operator(&self, id: OperatorId) -> Option<&Operator> {
        self.operators.iter().find(|operator| operator.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_builder_rejects_self_loop() {
        let op = OperatorId::new();
        let result = ConnectionBuilder::default()
            .from(Endpoint::new(op, "out"))
            .to(Endpoint::new(op, "in"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_add_operator_and_connect() {
        let mut content = WorkflowContent::default();
        let a = content.add_operator(Uuid::from_u128(1), "a");
        let b = content.add_operator(Uuid::from_u128(1), "b");
        content.connect(Endpoint::new(a, "y"), Endpoint::new(b, "x")).unwrap();

        assert_eq!(content.operators.len(), 2);
        assert_ne!(a, b);
        assert_eq!(content.operator(b).map(|op| op.name.as_str()), Some("b"));
        assert_eq!(content.connections[0].to.operator_id, b);
    }

    #[test]
    fn test_connect_rejects_self_loop() {
        let mut content = WorkflowContent::default();
        let a = content.add_operator(Uuid::from_u128(1), "a");

        let err = content
            .connect(Endpoint::new(a, "y"), Endpoint::new(a, "x"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRevision(_)), "unexpected error: {err}");
        assert!(content.connections.is_empty());
    }

    #[test]
    fn test_connect_rejects_unknown_operator() {
        let mut content = WorkflowContent::default();
        let a = content.add_operator(Uuid::from_u128(1), "a");
        let stranger = OperatorId::new();

        assert!(content.connect(Endpoint::new(a, "y"), Endpoint::new(stranger, "x")).is_err());
        assert!(content.connect(Endpoint::new(stranger, "y"), Endpoint::new(a, "x")).is_err());
        assert!(content.connections.is_empty());
    }

    #[test]
    fn test_content_is_tagged() {
        let content = RevisionContent::Workflow(WorkflowContent::default());
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["kind"], "workflow");
    }
}
