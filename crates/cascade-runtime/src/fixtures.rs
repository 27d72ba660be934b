//! Revisions and payloads shared by the unit tests.

use std::collections::{BTreeMap, HashMap};

use cascade_core::BoxedError;
use cascade_core::revision::{
    CodeContent, Endpoint, Input, IoInterface, OperatorId, Output, TransformationRevision,
    WorkflowContent,
};
use cascade_core::types::DataType;
use cascade_core::wiring::{IoWiring, Wiring};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::assemble::ExecutionInputAssembler;
use crate::catalog::Catalog;
use crate::executor::{BodyCall, BodyRegistry};
use crate::flatten::flatten;
use crate::payload::{CodeModule, ComponentRecord, ExecutionInput};

/// Component with input `x` and output `y = 2 * x`.
pub fn doubler(n: u128) -> TransformationRevision {
    TransformationRevision::component(
        Uuid::from_u128(n),
        "Doubler",
        "Arithmetic",
        IoInterface::new(
            vec![Input::required("x", DataType::Int)],
            vec![Output::new("y", DataType::Int)],
        ),
        CodeContent {
            code_module_id: Uuid::from_u128(n + 1000),
            function_name: "double".into(),
            source: "def double(x):\n    return {\"y\": 2 * x}\n".into(),
        },
    )
}

/// Component with a single `data` input and no outputs.
pub fn sink(n: u128) -> TransformationRevision {
    TransformationRevision::component(
        Uuid::from_u128(n + 500),
        "Collector",
        "Sinks",
        IoInterface::new(vec![Input::required("data", DataType::Any)], vec![]),
        CodeContent {
            code_module_id: Uuid::from_u128(n + 1500),
            function_name: "collect".into(),
            source: "def collect(data):\n    return {}\n".into(),
        },
    )
}

/// Workflow running `count` instances of `child` in series, from `x` to `y`.
pub fn chain(
    id: u128,
    child: &TransformationRevision,
    count: usize,
) -> (TransformationRevision, HashMap<OperatorId, TransformationRevision>) {
    let mut content = WorkflowContent::default();
    let operators: Vec<_> = (0..count)
        .map(|i| content.add_operator(child.id, format!("{} {i}", child.name)))
        .collect();

    for pair in operators.windows(2) {
        content
            .connect(Endpoint::new(pair[0], "y"), Endpoint::new(pair[1], "x"))
            .expect("chained operators differ");
    }
    if let (Some(first), Some(last)) = (operators.first(), operators.last()) {
        content.expose_input("x", Endpoint::new(*first, "x"));
        content.expose_output("y", Endpoint::new(*last, "y"));
    }

    let workflow = TransformationRevision::workflow(
        Uuid::from_u128(id),
        format!("Chain of {count}"),
        "Workflows",
        child.io_interface.clone(),
        content,
    );
    let closure = operators.into_iter().map(|op| (op, child.clone())).collect();
    (workflow, closure)
}

fn double(call: BodyCall<'_>) -> Result<BTreeMap<String, Value>, BoxedError> {
    let x = call
        .inputs
        .get("x")
        .and_then(Value::as_i64)
        .ok_or("x must be an integer")?;
    Ok(BTreeMap::from([("y".to_owned(), json!(2 * x))]))
}

fn collect(_: BodyCall<'_>) -> Result<BTreeMap<String, Value>, BoxedError> {
    Ok(BTreeMap::new())
}

/// Bodies of [`doubler`] and [`sink`] for every code module.
pub fn bodies() -> BodyRegistry {
    let mut bodies = BodyRegistry::with_builtins();
    bodies.register_builtin("double", double);
    bodies.register_builtin("collect", collect);
    bodies
}

/// Catalog holding the artifacts of `revisions`.
pub fn catalog<'a>(revisions: impl IntoIterator<Item = &'a TransformationRevision>) -> Catalog {
    let (modules, records): (Vec<_>, Vec<_>) = revisions
        .into_iter()
        .filter_map(|revision| {
            Some((
                CodeModule::from_revision(revision)?,
                ComponentRecord::from_revision(revision)?,
            ))
        })
        .unzip();
    Catalog::new(modules, records)
}

/// Valid input running one doubler on `x = 5`.
pub fn execution_input() -> ExecutionInput {
    let component = doubler(1);
    let (workflow, closure) = chain(10, &component, 1);
    let node = flatten(&workflow, &closure).expect("fixture flattens");

    ExecutionInputAssembler::new(workflow.id)
        .with_revisions(closure.values())
        .with_wiring(Some(Wiring::new(vec![IoWiring::direct("x", json!(5))], vec![])))
        .with_job_id(Uuid::from_u128(77))
        .assemble(node)
        .expect("fixture assembles")
}
