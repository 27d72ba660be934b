//! Graph flattening.
//!
//! Turns a root revision and the closure of revisions it references into a
//! [`FlattenedNode`] tree mirroring the nesting of the original workflows.
//! The closure must be complete and acyclic: a missing entry or a revision
//! nested inside itself is an integrity error.

use std::collections::{HashMap, HashSet};

use cascade_core::revision::{
    Connection, IoInterface, IoMapping, OperatorId, RevisionContent, TransformationRevision,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Tracing target for flattening.
const TRACING_TARGET: &str = "cascade_runtime::flatten";

/// Executable node of a flattened graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node_kind", rename_all = "snake_case")]
pub enum FlattenedNode {
    Component(ComponentNode),
    Workflow(WorkflowNode),
}

/// Leaf node running one component body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentNode {
    /// Operator id, or the revision id for a component root.
    pub id: OperatorId,
    pub name: String,
    /// Revision the node instances.
    pub component_id: Uuid,
    pub code_module_id: Uuid,
    pub function_name: String,
    pub interface: IoInterface,
}

/// Inner node running its children in connection order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Operator id, or the revision id for a workflow root.
    pub id: OperatorId,
    pub name: String,
    /// Revision the node instances.
    pub workflow_id: Uuid,
    pub interface: IoInterface,
    pub children: Vec<FlattenedNode>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub inputs: Vec<IoMapping>,
    #[serde(default)]
    pub outputs: Vec<IoMapping>,
}

impl FlattenedNode {
    /// Returns the node identity.
    pub fn id(&self) -> OperatorId {
        match self {
            Self::Component(node) => node.id,
            Self::Workflow(node) => node.id,
        }
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        match self {
            Self::Component(node) => &node.name,
            Self::Workflow(node) => &node.name,
        }
    }

    /// Returns the typed interface.
    pub fn interface(&self) -> &IoInterface {
        match self {
            Self::Component(node) => &node.interface,
            Self::Workflow(node) => &node.interface,
        }
    }

    /// Returns every component node of the tree, depth first.
    pub fn component_nodes(&self) -> Vec<&ComponentNode> {
        let mut nodes = Vec::new();
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node {
                Self::Component(component) => nodes.push(component),
                Self::Workflow(workflow) => pending.extend(workflow.children.iter().rev()),
            }
        }
        nodes
    }

    /// Returns the number of nodes below the root.
    pub fn descendant_count(&self) -> usize {
        match self {
            Self::Component(_) => 0,
            Self::Workflow(workflow) => workflow
                .children
                .iter()
                .map(|child| 1 + child.descendant_count())
                .sum(),
        }
    }
}

/// Flattens `root` using the revisions its operators reference.
///
/// `closure` maps operator ids to the revisions they instance and must cover
/// every operator reachable from `root`. Revision states are not checked.
pub fn flatten(
    root: &TransformationRevision,
    closure: &HashMap<OperatorId, TransformationRevision>,
) -> Result<FlattenedNode> {
    let mut ancestors = HashSet::new();
    let node = flatten_revision(
        OperatorId::from_uuid(root.id),
        &root.name,
        root,
        closure,
        &mut ancestors,
    )?;

    tracing::debug!(
        target: TRACING_TARGET,
        root_id = %root.id,
        node_count = node.descendant_count(),
        "Flattened revision"
    );

    Ok(node)
}

fn flatten_revision(
    id: OperatorId,
    name: &str,
    revision: &TransformationRevision,
    closure: &HashMap<OperatorId, TransformationRevision>,
    ancestors: &mut HashSet<Uuid>,
) -> Result<FlattenedNode> {
    match &revision.content {
        RevisionContent::Code(code) => Ok(FlattenedNode::Component(ComponentNode {
            id,
            name: name.to_owned(),
            component_id: revision.id,
            code_module_id: code.code_module_id,
            function_name: code.function_name.clone(),
            interface: revision.io_interface.clone(),
        })),
        RevisionContent::Workflow(content) => {
            ancestors.insert(revision.id);
            let mut children = Vec::with_capacity(content.operators.len());
            for operator in &content.operators {
                let Some(nested) = closure.get(&operator.id) else {
                    return Err(Error::Integrity(format!(
                        "operator {} of transformation revision {} is not contained in the \
                         supplied closure of nested revisions",
                        operator.id, revision.id
                    )));
                };
                if nested.id != operator.revision_id {
                    return Err(Error::Integrity(format!(
                        "operator {} of transformation revision {} references {} but the \
                         closure holds {}",
                        operator.id, revision.id, operator.revision_id, nested.id
                    )));
                }
                if nested.workflow_content().is_some() && ancestors.contains(&nested.id) {
                    return Err(Error::Integrity(format!(
                        "operator {} of transformation revision {} nests revision {} inside \
                         itself",
                        operator.id, revision.id, nested.id
                    )));
                }

                children.push(flatten_revision(
                    operator.id,
                    &operator.name,
                    nested,
                    closure,
                    ancestors,
                )?);
            }
            ancestors.remove(&revision.id);

            Ok(FlattenedNode::Workflow(WorkflowNode {
                id,
                name: name.to_owned(),
                workflow_id: revision.id,
                interface: revision.io_interface.clone(),
                children,
                connections: content.connections.clone(),
                inputs: content.inputs.clone(),
                outputs: content.outputs.clone(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use cascade_core::revision::{RevisionState, WorkflowContent};

    use super::*;
    use crate::fixtures;

    #[test]
    fn test_component_root_is_single_node() {
        let component = fixtures::doubler(1);
        let node = flatten(&component, &HashMap::new()).unwrap();

        let FlattenedNode::Component(node) = node else {
            panic!("expected a component node");
        };
        assert_eq!(node.component_id, component.id);
        assert_eq!(node.id.as_uuid(), component.id);
    }

    #[test]
    fn test_one_node_per_operator_with_local_ids() {
        let component = fixtures::doubler(1);
        let (inner, inner_closure) = fixtures::chain(10, &component, 2);
        let (outer, mut closure) = fixtures::chain(20, &inner, 3);
        closure.extend(inner_closure);

        let node = flatten(&outer, &closure).unwrap();
        let FlattenedNode::Workflow(workflow) = &node else {
            panic!("expected a workflow node");
        };

        let outer_content = outer.workflow_content().unwrap();
        let child_ids: Vec<_> = workflow.children.iter().map(FlattenedNode::id).collect();
        let operator_ids: Vec<_> = outer_content.operators.iter().map(|op| op.id).collect();
        assert_eq!(child_ids, operator_ids);

        // 3 inner workflows, each with 2 component operators
        assert_eq!(node.descendant_count(), 3 + 3 * 2);
        assert_eq!(node.component_nodes().len(), 6);
    }

    #[test]
    fn test_shared_revision_instanced_independently() {
        let component = fixtures::doubler(1);
        let (workflow, closure) = fixtures::chain(10, &component, 2);

        let node = flatten(&workflow, &closure).unwrap();
        let components = node.component_nodes();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].component_id, components[1].component_id);
        assert_ne!(components[0].id, components[1].id);
    }

    #[test]
    fn test_missing_closure_entry_is_integrity_error() {
        let component = fixtures::doubler(1);
        let (workflow, closure) = fixtures::chain(10, &component, 3);

        for removed in closure.keys() {
            let mut partial = closure.clone();
            partial.remove(removed);

            let err = flatten(&workflow, &partial).unwrap_err();
            assert!(matches!(err, Error::Integrity(_)), "unexpected error: {err}");
        }
    }

    #[test]
    fn test_wrong_revision_in_closure_is_integrity_error() {
        let component = fixtures::doubler(1);
        let (workflow, mut closure) = fixtures::chain(10, &component, 1);
        let other = fixtures::doubler(2);
        for entry in closure.values_mut() {
            *entry = other.clone();
        }

        assert!(matches!(flatten(&workflow, &closure), Err(Error::Integrity(_))));
    }

    #[test]
    fn test_self_nested_workflow_is_integrity_error() {
        let mut content = WorkflowContent::default();
        let id = Uuid::from_u128(42);
        let operator = content.add_operator(id, "self");
        let workflow = TransformationRevision::workflow(
            id,
            "Recursive",
            "Workflows",
            IoInterface::default(),
            content,
        );
        let closure = HashMap::from([(operator, workflow.clone())]);

        let err = flatten(&workflow, &closure).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)), "unexpected error: {err}");
    }

    #[test]
    fn test_mutually_nested_workflows_are_integrity_error() {
        let (a_id, b_id) = (Uuid::from_u128(42), Uuid::from_u128(43));

        let mut a_content = WorkflowContent::default();
        let a_operator = a_content.add_operator(b_id, "b");
        let a = TransformationRevision::workflow(
            a_id,
            "A",
            "Workflows",
            IoInterface::default(),
            a_content,
        );

        let mut b_content = WorkflowContent::default();
        let b_operator = b_content.add_operator(a_id, "a");
        let b = TransformationRevision::workflow(
            b_id,
            "B",
            "Workflows",
            IoInterface::default(),
            b_content,
        );

        let closure = HashMap::from([(a_operator, b.clone()), (b_operator, a.clone())]);
        assert!(matches!(flatten(&a, &closure), Err(Error::Integrity(_))));
        assert!(matches!(flatten(&b, &closure), Err(Error::Integrity(_))));
    }

    #[test]
    fn test_wrapped_component_is_not_a_cycle() {
        let component = fixtures::doubler(1);
        let (workflow, operator) = component.wrap_into_workflow().unwrap();
        let closure = HashMap::from([(operator, component.clone())]);

        let node = flatten(&workflow, &closure).unwrap();
        assert_eq!(node.component_nodes()[0].component_id, component.id);
    }

    #[test]
    fn test_sibling_instances_are_not_cycles() {
        let component = fixtures::doubler(1);
        let (inner, inner_closure) = fixtures::chain(10, &component, 1);
        let (outer, mut closure) = fixtures::chain(20, &inner, 2);
        closure.extend(inner_closure);

        assert!(flatten(&outer, &closure).is_ok());
    }

    #[test]
    fn test_disabled_and_draft_revisions_are_structurally_allowed() {
        let component = fixtures::doubler(1).with_state(RevisionState::Disabled);
        let (workflow, closure) = fixtures::chain(10, &component, 1);
        let workflow = workflow.with_state(RevisionState::Draft);

        assert!(flatten(&workflow, &closure).is_ok());
    }

    #[test]
    fn test_serde_round_trip_keeps_tree() {
        let component = fixtures::doubler(1);
        let (workflow, closure) = fixtures::chain(10, &component, 2);
        let node = flatten(&workflow, &closure).unwrap();

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["node_kind"], "workflow");
        let parsed: FlattenedNode = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, node);
    }
}
