//! Concurrent adapter fan-out.
//!
//! Every binding of one direction is a separate unit of work. All units run
//! to completion; failed bindings are collected into one [`AdapterError`]
//! and no value of the fan-out is returned if any binding failed.

use std::collections::BTreeMap;
use std::future::Future;

use cascade_core::wiring::IoWiring;
use futures::future::join_all;
use serde_json::Value;

use crate::adapter::{AdapterContext, AdapterRegistry, BindingDescriptor, Direction};
use crate::error::{AdapterError, BindingFailure};
use crate::resolve::{resolve, DispatchableBinding};

/// Tracing target for adapter dispatch.
const TRACING_TARGET: &str = "cascade_runtime::dispatch";

/// Waits for every unit and aggregates the failed ones.
pub(crate) async fn settle<F>(
    direction: Direction,
    units: impl IntoIterator<Item = (String, F)>,
) -> Result<BTreeMap<String, Value>, AdapterError>
where
    F: Future<Output = Result<Value, BindingFailure>>,
{
    let settled = join_all(
        units
            .into_iter()
            .map(|(name, unit)| async move { (name, unit.await) }),
    )
    .await;

    let mut values = BTreeMap::new();
    let mut failures = BTreeMap::new();
    for (name, outcome) in settled {
        match outcome {
            Ok(value) => {
                values.insert(name, value);
            }
            Err(failure) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    %direction,
                    binding = %name,
                    error = %failure.message,
                    "Binding failed"
                );
                failures.insert(name, failure);
            }
        }
    }

    if failures.is_empty() {
        Ok(values)
    } else {
        Err(AdapterError::aggregate(direction, failures))
    }
}

/// Dispatches wiring entries to the adapters of a registry.
#[derive(Debug, Clone, Copy)]
pub struct AdapterDispatcher<'a> {
    registry: &'a AdapterRegistry,
    ctx: AdapterContext<'a>,
}

impl<'a> AdapterDispatcher<'a> {
    pub fn new(registry: &'a AdapterRegistry, ctx: AdapterContext<'a>) -> Self {
        Self { registry, ctx }
    }

    /// Loads one value per input wiring, keyed by `workflow_io_name`.
    pub async fn load(&self, wirings: &[IoWiring]) -> Result<BTreeMap<String, Value>, AdapterError> {
        let units = wirings.iter().map(|wiring| {
            let unit = self.dispatch(Direction::Load, wiring, None);
            (wiring.workflow_io_name.clone(), unit)
        });

        let values = settle(Direction::Load, units).await?;
        tracing::debug!(
            target: TRACING_TARGET,
            count = values.len(),
            "Loaded wired inputs"
        );
        Ok(values)
    }

    /// Sends the value of every output wiring.
    ///
    /// A wiring without a value in `values` fails its binding.
    pub async fn send(
        &self,
        wirings: &[IoWiring],
        values: &BTreeMap<String, Value>,
    ) -> Result<(), AdapterError> {
        let units = wirings.iter().map(|wiring| {
            let value = values.get(&wiring.workflow_io_name);
            let unit = self.dispatch(Direction::Send, wiring, Some(value));
            (wiring.workflow_io_name.clone(), unit)
        });

        let sent = settle(Direction::Send, units).await?;
        tracing::debug!(
            target: TRACING_TARGET,
            count = sent.len(),
            "Sent wired outputs"
        );
        Ok(())
    }

    /// Runs one unit. `sent` is `Some` for sends and holds the value, if any.
    async fn dispatch(
        &self,
        direction: Direction,
        wiring: &IoWiring,
        sent: Option<Option<&Value>>,
    ) -> Result<Value, BindingFailure> {
        let name = &wiring.workflow_io_name;
        let binding = resolve(wiring, direction).map_err(|err| BindingFailure {
            message: err.to_string(),
            descriptor: Some(BindingDescriptor::from(wiring)),
        })?;

        let (adapter_id, descriptor) = match binding {
            DispatchableBinding::Direct { value } => return Ok(value.unwrap_or(Value::Null)),
            DispatchableBinding::Adapter {
                adapter_id,
                descriptor,
            } => (adapter_id, descriptor),
        };

        let failure = |message: String| BindingFailure {
            message,
            descriptor: Some(descriptor.clone()),
        };

        let Some(adapter) = self.registry.get(&adapter_id) else {
            return Err(failure(format!("no adapter registered with id '{adapter_id}'")));
        };

        let bindings = BTreeMap::from([(name.clone(), descriptor.clone())]);
        let outcome = match sent {
            None => adapter.load(&self.ctx, &bindings).await,
            Some(None) => return Err(failure(format!("no value computed for output '{name}'"))),
            Some(Some(value)) => {
                let values = BTreeMap::from([(name.clone(), value.clone())]);
                adapter.send(&self.ctx, &bindings, &values).await
            }
        };

        match outcome {
            Ok(mut values) => match direction {
                Direction::Load => values
                    .remove(name)
                    .ok_or_else(|| failure(format!("adapter '{adapter_id}' returned no value"))),
                Direction::Send => Ok(Value::Null),
            },
            Err(err) => Err(unwrap_failure(err, name).unwrap_or_else(|err| failure(err.to_string()))),
        }
    }
}

/// Extracts the failure of `name` from an adapter's own aggregate.
fn unwrap_failure(err: AdapterError, name: &str) -> Result<BindingFailure, AdapterError> {
    match err.failures().get(name) {
        Some(failure) => Ok(failure.clone()),
        None => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use cascade_core::wiring::DIRECT_PROVISIONING;
    use serde_json::json;

    use super::*;
    use crate::adapter::Adapter;
    use crate::catalog::Catalog;
    use crate::executor::LocalExecutor;

    /// Serves values from a fixed table keyed by reference.
    struct TableAdapter(BTreeMap<String, Value>);

    #[async_trait::async_trait]
    impl Adapter for TableAdapter {
        fn id(&self) -> &str {
            "table"
        }

        async fn load(
            &self,
            _ctx: &AdapterContext<'_>,
            bindings: &BTreeMap<String, BindingDescriptor>,
        ) -> Result<BTreeMap<String, Value>, AdapterError> {
            let mut values = BTreeMap::new();
            for (name, descriptor) in bindings {
                let reference = descriptor.reference().unwrap_or_default();
                let value = self
                    .0
                    .get(reference)
                    .ok_or_else(|| AdapterError::new(format!("unknown entry {reference}")))?;
                values.insert(name.clone(), value.clone());
            }
            Ok(values)
        }
    }

    fn registry() -> AdapterRegistry {
        AdapterRegistry::new().with_adapter(TableAdapter(BTreeMap::from([
            ("a".to_owned(), json!(1)),
            ("b".to_owned(), json!(2)),
        ])))
    }

    #[tokio::test]
    async fn test_load_mixed_bindings() {
        let registry = registry();
        let catalog = Catalog::default();
        let executor = LocalExecutor::default();
        let dispatcher = AdapterDispatcher::new(&registry, AdapterContext::new(&catalog, &executor));

        let values = dispatcher
            .load(&[
                IoWiring::new("first", "table").with_ref_id("a"),
                IoWiring::direct("second", json!("literal")),
            ])
            .await
            .unwrap();

        assert_eq!(values["first"], json!(1));
        assert_eq!(values["second"], json!("literal"));
    }

    #[tokio::test]
    async fn test_partial_failure_aggregated() {
        let registry = registry();
        let catalog = Catalog::default();
        let executor = LocalExecutor::default();
        let dispatcher = AdapterDispatcher::new(&registry, AdapterContext::new(&catalog, &executor));

        let err = dispatcher
            .load(&[
                IoWiring::new("x", "table").with_ref_id("a"),
                IoWiring::new("y", "table").with_ref_id("missing"),
                IoWiring::new("z", "table").with_ref_id("b"),
            ])
            .await
            .unwrap_err();

        assert_eq!(err.failures().len(), 1);
        let failure = &err.failures()["y"];
        assert!(failure.message.contains("unknown entry missing"));
        assert_eq!(
            failure.descriptor.as_ref().and_then(|d| d.reference()),
            Some("missing")
        );
    }

    #[tokio::test]
    async fn test_unknown_adapter_is_binding_failure() {
        let registry = AdapterRegistry::new();
        let catalog = Catalog::default();
        let executor = LocalExecutor::default();
        let dispatcher = AdapterDispatcher::new(&registry, AdapterContext::new(&catalog, &executor));

        let err = dispatcher
            .load(&[
                IoWiring::new("x", "nowhere").with_ref_id("a"),
                IoWiring::new("y", DIRECT_PROVISIONING),
            ])
            .await
            .unwrap_err();

        assert_eq!(err.failures().len(), 2);
        assert!(err.failures()["x"].message.contains("nowhere"));
        assert!(err.failures()["y"].message.contains("'value'"));
    }

    #[tokio::test]
    async fn test_send_without_support_fails() {
        let registry = registry();
        let catalog = Catalog::default();
        let executor = LocalExecutor::default();
        let dispatcher = AdapterDispatcher::new(&registry, AdapterContext::new(&catalog, &executor));
        let values = BTreeMap::from([("out".to_owned(), json!(3))]);

        let err = dispatcher
            .send(&[IoWiring::new("out", "table").with_ref_id("a")], &values)
            .await
            .unwrap_err();
        assert!(err.failures()["out"].message.contains("does not support sending"));
    }

    #[tokio::test]
    async fn test_settle_keeps_all_failures() {
        let units = (0..4).map(|i| {
            let name = format!("b{i}");
            let unit = async move {
                if i % 2 == 0 {
                    Ok(json!(i))
                } else {
                    Err(BindingFailure {
                        message: format!("odd {i}"),
                        descriptor: None,
                    })
                }
            };
            (name, unit)
        });

        let err = settle(Direction::Send, units).await.unwrap_err();
        assert_eq!(err.failures().len(), 2);
        assert!(err.to_string().contains("errors when sending wired outputs"));
    }
}
