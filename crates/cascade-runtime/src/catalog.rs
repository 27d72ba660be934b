//! Code modules and components available to one execution.

use std::collections::HashMap;

use uuid::Uuid;

use crate::payload::{CodeModule, ComponentRecord, ExecutionInput};

/// Read-only lookup of the artifacts carried by an execution input.
///
/// Passed explicitly to every adapter call; adapters never reach for ambient
/// state.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    code_modules: HashMap<Uuid, CodeModule>,
    components: HashMap<Uuid, ComponentRecord>,
}

impl Catalog {
    /// Builds a catalog from artifact lists. Later duplicates are ignored.
    pub fn new(
        code_modules: impl IntoIterator<Item = CodeModule>,
        components: impl IntoIterator<Item = ComponentRecord>,
    ) -> Self {
        let mut catalog = Self::default();
        for module in code_modules {
            catalog.code_modules.entry(module.id).or_insert(module);
        }
        for component in components {
            catalog.components.entry(component.id).or_insert(component);
        }
        catalog
    }

    /// Builds the catalog of an execution input.
    pub fn from_input(input: &ExecutionInput) -> Self {
        Self::new(input.code_modules.iter().cloned(), input.components.iter().cloned())
    }

    pub fn code_module(&self, id: Uuid) -> Option<&CodeModule> {
        self.code_modules.get(&id)
    }

    pub fn component(&self, id: Uuid) -> Option<&ComponentRecord> {
        self.components.get(&id)
    }

    pub fn code_modules(&self) -> impl Iterator<Item = &CodeModule> {
        self.code_modules.values()
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentRecord> {
        self.components.values()
    }
}
