//! In-process evaluation of a flattened graph.

use std::collections::{BTreeMap, HashMap};

use cascade_core::revision::{IoInterface, OperatorId};
use cascade_core::types::{parse_value, DataType};
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::body::{BodyCall, BodyRegistry};
use crate::flatten::{ComponentNode, FlattenedNode, WorkflowNode};

/// Tracing target for graph evaluation.
const TRACING_TARGET: &str = "cascade_runtime::executor::graph";

/// Failure of the executed logic itself.
#[derive(Debug, Error)]
pub enum NodeFailure {
    #[error("input '{input}' of {node} has no value")]
    MissingInput { node: String, input: String },

    #[error("input '{input}' of {node} is invalid: {source}")]
    InvalidInput {
        node: String,
        input: String,
        #[source]
        source: cascade_core::Error,
    },

    #[error("no body for function '{function_name}' of code module {code_module_id} ({node})")]
    MissingBody {
        node: String,
        code_module_id: Uuid,
        function_name: String,
    },

    #[error("{node} failed: {message}")]
    Body { node: String, message: String },

    #[error("{node} did not produce output '{output}'")]
    MissingOutput { node: String, output: String },

    #[error("connections of {node} contain a cycle")]
    Cycle { node: String },

    #[error("{node} references unknown operator {operator}")]
    UnknownOperator { node: String, operator: OperatorId },
}

fn label(name: &str, id: OperatorId) -> String {
    format!("{name} ({id})")
}

/// Returns true if every output of a non-empty interface is a plot.
fn is_pure_plot(interface: &IoInterface) -> bool {
    !interface.outputs.is_empty()
        && interface
            .outputs
            .iter()
            .all(|output| output.data_type == DataType::PlotlyJson)
}

/// Evaluates flattened nodes with registered bodies.
#[derive(Debug, Clone, Copy)]
pub struct GraphRunner<'a> {
    bodies: &'a BodyRegistry,
    run_pure_plot_operators: bool,
}

impl<'a> GraphRunner<'a> {
    pub fn new(bodies: &'a BodyRegistry, run_pure_plot_operators: bool) -> Self {
        Self {
            bodies,
            run_pure_plot_operators,
        }
    }

    /// Evaluates `node` and returns its outputs by name.
    pub fn run(
        &self,
        node: &FlattenedNode,
        inputs: BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, NodeFailure> {
        match node {
            FlattenedNode::Component(component) => self.run_component(component, inputs),
            FlattenedNode::Workflow(workflow) => self.run_workflow(workflow, inputs),
        }
    }

    fn run_component(
        &self,
        node: &ComponentNode,
        mut provided: BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, NodeFailure> {
        let name = label(&node.name, node.id);

        if !self.run_pure_plot_operators && is_pure_plot(&node.interface) {
            tracing::debug!(target: TRACING_TARGET, node = %name, "Skipped pure plot operator");
            return Ok(node
                .interface
                .outputs
                .iter()
                .map(|output| (output.name.clone(), Value::Null))
                .collect());
        }

        let mut inputs = BTreeMap::new();
        for input in &node.interface.inputs {
            let value = provided
                .remove(&input.name)
                .or_else(|| input.default_value().cloned())
                .ok_or_else(|| NodeFailure::MissingInput {
                    node: name.clone(),
                    input: input.name.clone(),
                })?;
            let value = parse_value(input.data_type, value).map_err(|source| {
                NodeFailure::InvalidInput {
                    node: name.clone(),
                    input: input.name.clone(),
                    source,
                }
            })?;
            inputs.insert(input.name.clone(), value);
        }

        let body = self
            .bodies
            .get(node.code_module_id, &node.function_name)
            .ok_or_else(|| NodeFailure::MissingBody {
                node: name.clone(),
                code_module_id: node.code_module_id,
                function_name: node.function_name.clone(),
            })?;

        let mut outputs = body
            .call(BodyCall {
                interface: &node.interface,
                inputs,
            })
            .map_err(|err| NodeFailure::Body {
                node: name.clone(),
                message: err.to_string(),
            })?;

        let mut declared = BTreeMap::new();
        for output in &node.interface.outputs {
            let value = outputs.remove(&output.name).ok_or_else(|| NodeFailure::MissingOutput {
                node: name.clone(),
                output: output.name.clone(),
            })?;
            declared.insert(output.name.clone(), value);
        }

        tracing::trace!(target: TRACING_TARGET, node = %name, "Ran component");
        Ok(declared)
    }

    fn run_workflow(
        &self,
        node: &WorkflowNode,
        mut provided: BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, NodeFailure> {
        let name = label(&node.name, node.id);

        let mut graph = DiGraph::<usize, ()>::with_capacity(node.children.len(), node.connections.len());
        let indices: HashMap<OperatorId, _> = node
            .children
            .iter()
            .enumerate()
            .map(|(position, child)| (child.id(), graph.add_node(position)))
            .collect();
        let index_of = |operator: OperatorId| {
            indices
                .get(&operator)
                .copied()
                .ok_or_else(|| NodeFailure::UnknownOperator {
                    node: name.clone(),
                    operator,
                })
        };

        for connection in &node.connections {
            graph.add_edge(
                index_of(connection.from.operator_id)?,
                index_of(connection.to.operator_id)?,
                (),
            );
        }
        let order = toposort(&graph, None).map_err(|_| NodeFailure::Cycle { node: name.clone() })?;

        let mut pending: HashMap<OperatorId, BTreeMap<String, Value>> = HashMap::new();
        for mapping in &node.inputs {
            index_of(mapping.endpoint.operator_id)?;
            let value = provided.remove(&mapping.name).or_else(|| {
                node.interface
                    .input(&mapping.name)
                    .and_then(|input| input.default_value().cloned())
            });
            if let Some(value) = value {
                pending
                    .entry(mapping.endpoint.operator_id)
                    .or_default()
                    .insert(mapping.endpoint.connector.clone(), value);
            }
        }

        let mut produced: HashMap<OperatorId, BTreeMap<String, Value>> = HashMap::new();
        for index in order {
            let child = &node.children[graph[index]];
            let child_id = child.id();

            let mut inputs = pending.remove(&child_id).unwrap_or_default();
            for connection in node.connections.iter().filter(|c| c.to.operator_id == child_id) {
                let value = produced
                    .get(&connection.from.operator_id)
                    .and_then(|outputs| outputs.get(&connection.from.connector))
                    .cloned()
                    .ok_or_else(|| NodeFailure::MissingOutput {
                        node: format!("operator {}", connection.from.operator_id),
                        output: connection.from.connector.clone(),
                    })?;
                inputs.insert(connection.to.connector.clone(), value);
            }

            let outputs = self.run(child, inputs)?;
            produced.insert(child_id, outputs);
        }

        let mut outputs = BTreeMap::new();
        for mapping in &node.outputs {
            let value = produced
                .get(&mapping.endpoint.operator_id)
                .and_then(|values| values.get(&mapping.endpoint.connector))
                .cloned()
                .ok_or_else(|| NodeFailure::MissingOutput {
                    node: name.clone(),
                    output: mapping.name.clone(),
                })?;
            outputs.insert(mapping.name.clone(), value);
        }

        tracing::trace!(target: TRACING_TARGET, node = %name, "Ran workflow");
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use cascade_core::revision::{
        Endpoint, Input, IoInterface, Output, TransformationRevision, WorkflowContent,
    };
    use serde_json::json;

    use super::*;
    use crate::flatten::flatten;
    use crate::fixtures;

    fn run(node: &FlattenedNode, x: Value) -> Result<BTreeMap<String, Value>, NodeFailure> {
        let bodies = fixtures::bodies();
        GraphRunner::new(&bodies, false).run(node, BTreeMap::from([("x".to_owned(), x)]))
    }

    #[test]
    fn test_chain_of_doublers() {
        let component = fixtures::doubler(1);
        let (workflow, closure) = fixtures::chain(10, &component, 3);
        let node = flatten(&workflow, &closure).unwrap();

        let outputs = run(&node, json!(1)).unwrap();
        assert_eq!(outputs["y"], json!(8));
    }

    #[test]
    fn test_nested_workflows() {
        let component = fixtures::doubler(1);
        let (inner, inner_closure) = fixtures::chain(10, &component, 2);
        let (outer, mut closure) = fixtures::chain(20, &inner, 2);
        closure.extend(inner_closure);
        let node = flatten(&outer, &closure).unwrap();

        let outputs = run(&node, json!(3)).unwrap();
        assert_eq!(outputs["y"], json!(48));
    }

    #[test]
    fn test_inputs_are_parsed() {
        let component = fixtures::doubler(1);
        let node = flatten(&component, &HashMap::new()).unwrap();

        assert_eq!(run(&node, json!("21")).unwrap()["y"], json!(42));
        assert!(matches!(
            run(&node, json!("abc")),
            Err(NodeFailure::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_missing_input() {
        let component = fixtures::doubler(1);
        let node = flatten(&component, &HashMap::new()).unwrap();
        let bodies = fixtures::bodies();

        let err = GraphRunner::new(&bodies, false)
            .run(&node, BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, NodeFailure::MissingInput { input, .. } if input == "x"));
    }

    #[test]
    fn test_missing_body() {
        let component = fixtures::doubler(1);
        let node = flatten(&component, &HashMap::new()).unwrap();
        let bodies = BodyRegistry::new();

        let err = GraphRunner::new(&bodies, false)
            .run(&node, BTreeMap::from([("x".to_owned(), json!(1))]))
            .unwrap_err();
        assert!(matches!(err, NodeFailure::MissingBody { .. }));
    }

    #[test]
    fn test_pure_plot_skipped_unless_enabled() {
        let mut plot = fixtures::doubler(1);
        plot.io_interface = IoInterface::new(
            vec![Input::required("x", DataType::Int)],
            vec![Output::new("y", DataType::PlotlyJson)],
        );
        let node = flatten(&plot, &HashMap::new()).unwrap();
        let bodies = fixtures::bodies();
        let inputs = BTreeMap::from([("x".to_owned(), json!(2))]);

        let skipped = GraphRunner::new(&bodies, false).run(&node, inputs.clone()).unwrap();
        assert_eq!(skipped["y"], Value::Null);

        let ran = GraphRunner::new(&bodies, true).run(&node, inputs).unwrap();
        assert_eq!(ran["y"], json!(4));
    }

    #[test]
    fn test_cycle_detected() {
        let component = fixtures::doubler(1);
        let mut content = WorkflowContent::default();
        let a = content.add_operator(component.id, "a");
        let b = content.add_operator(component.id, "b");
        content
            .connect(Endpoint::new(a, "y"), Endpoint::new(b, "x"))
            .and_then(|content| content.connect(Endpoint::new(b, "y"), Endpoint::new(a, "x")))
            .unwrap();
        let workflow = TransformationRevision::workflow(
            Uuid::from_u128(50),
            "Loop",
            "Test",
            IoInterface::default(),
            content,
        );
        let closure = HashMap::from([(a, component.clone()), (b, component)]);
        let node = flatten(&workflow, &closure).unwrap();

        let bodies = fixtures::bodies();
        let err = GraphRunner::new(&bodies, false)
            .run(&node, BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, NodeFailure::Cycle { .. }));
    }
}
