//! Executable component bodies.
//!
//! Component code is opaque to the runtime. The in-process executor maps a
//! component's code module id and function name to a registered
//! [`ComponentBody`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use cascade_core::revision::IoInterface;
use cascade_core::BoxedError;
use serde_json::Value;
use uuid::Uuid;

/// Function name of the builtin body forwarding its single input.
pub const PASS_THROUGH: &str = "pass_through";

/// Arguments of one body invocation.
#[derive(Debug)]
pub struct BodyCall<'a> {
    /// Interface of the invoked component.
    pub interface: &'a IoInterface,
    /// Parsed input values, one per declared input.
    pub inputs: BTreeMap<String, Value>,
}

/// Executable logic of a component.
pub trait ComponentBody: Send + Sync {
    /// Computes the outputs, keyed by output name.
    fn call(&self, call: BodyCall<'_>) -> Result<BTreeMap<String, Value>, BoxedError>;
}

impl<F> ComponentBody for F
where
    F: Fn(BodyCall<'_>) -> Result<BTreeMap<String, Value>, BoxedError> + Send + Sync,
{
    fn call(&self, call: BodyCall<'_>) -> Result<BTreeMap<String, Value>, BoxedError> {
        self(call)
    }
}

/// Forwards the only input to the only output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl ComponentBody for PassThrough {
    fn call(&self, mut call: BodyCall<'_>) -> Result<BTreeMap<String, Value>, BoxedError> {
        let ([input], [output]) = (&call.interface.inputs[..], &call.interface.outputs[..]) else {
            return Err(format!("{PASS_THROUGH} needs exactly one input and one output").into());
        };

        let value = call.inputs.remove(&input.name).unwrap_or(Value::Null);
        Ok(BTreeMap::from([(output.name.clone(), value)]))
    }
}

/// Bodies keyed by code module id and function name.
///
/// Builtins are keyed by function name only and serve every code module
/// without a more specific registration.
#[derive(Clone, Default)]
pub struct BodyRegistry {
    modules: HashMap<Uuid, HashMap<String, Arc<dyn ComponentBody>>>,
    builtins: HashMap<String, Arc<dyn ComponentBody>>,
}

impl BodyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the builtin bodies.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtin(PASS_THROUGH, PassThrough);
        registry
    }

    /// Registers the body of one function of a code module.
    pub fn register(
        &mut self,
        code_module_id: Uuid,
        function_name: impl Into<String>,
        body: impl ComponentBody + 'static,
    ) {
        self.modules
            .entry(code_module_id)
            .or_default()
            .insert(function_name.into(), Arc::new(body));
    }

    /// Registers a body for every code module.
    pub fn register_builtin(&mut self, function_name: impl Into<String>, body: impl ComponentBody + 'static) {
        self.builtins.insert(function_name.into(), Arc::new(body));
    }

    /// Registers a body and returns the registry.
    #[must_use]
    pub fn with_body(
        mut self,
        code_module_id: Uuid,
        function_name: impl Into<String>,
        body: impl ComponentBody + 'static,
    ) -> Self {
        self.register(code_module_id, function_name, body);
        self
    }

    /// Looks up a body, preferring module registrations over builtins.
    pub fn get(&self, code_module_id: Uuid, function_name: &str) -> Option<Arc<dyn ComponentBody>> {
        self.modules
            .get(&code_module_id)
            .and_then(|functions| functions.get(function_name))
            .or_else(|| self.builtins.get(function_name))
            .cloned()
    }
}

impl fmt::Debug for BodyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builtins: Vec<_> = self.builtins.keys().collect();
        builtins.sort_unstable();

        f.debug_struct("BodyRegistry")
            .field("modules", &self.modules.len())
            .field("builtins", &builtins)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use cascade_core::revision::{Input, Output};
    use cascade_core::types::DataType;
    use serde_json::json;

    use super::*;

    fn interface() -> IoInterface {
        IoInterface::new(
            vec![Input::required("in", DataType::Any)],
            vec![Output::new("out", DataType::Any)],
        )
    }

    #[test]
    fn test_pass_through() {
        let interface = interface();
        let outputs = PassThrough
            .call(BodyCall {
                interface: &interface,
                inputs: BTreeMap::from([("in".to_owned(), json!([1, 2]))]),
            })
            .unwrap();
        assert_eq!(outputs["out"], json!([1, 2]));
    }

    #[test]
    fn test_pass_through_rejects_wide_interface() {
        let interface = IoInterface::new(vec![], vec![Output::new("out", DataType::Any)]);
        let call = BodyCall {
            interface: &interface,
            inputs: BTreeMap::new(),
        };
        assert!(PassThrough.call(call).is_err());
    }

    #[test]
    fn test_module_registration_wins_over_builtin() {
        let module = Uuid::from_u128(5);
        let registry = BodyRegistry::with_builtins().with_body(
            module,
            PASS_THROUGH,
            |_: BodyCall<'_>| -> Result<BTreeMap<String, Value>, BoxedError> {
                Ok(BTreeMap::from([("out".to_owned(), json!("custom"))]))
            },
        );

        let interface = interface();
        let call = || BodyCall {
            interface: &interface,
            inputs: BTreeMap::from([("in".to_owned(), json!(1))]),
        };

        let custom = registry.get(module, PASS_THROUGH).unwrap().call(call()).unwrap();
        assert_eq!(custom["out"], json!("custom"));

        let builtin = registry
            .get(Uuid::from_u128(6), PASS_THROUGH)
            .unwrap()
            .call(call())
            .unwrap();
        assert_eq!(builtin["out"], json!(1));
        assert!(registry.get(module, "missing").is_none());
    }
}
