//! Adapter lookup by id.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::Adapter;

/// Adapters available to an executor, keyed by adapter id.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn Adapter>>,
}

impl AdapterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter under its own id, replacing any earlier one.
    pub fn register(&mut self, adapter: impl Adapter + 'static) {
        let adapter: Arc<dyn Adapter> = Arc::new(adapter);
        self.adapters.insert(adapter.id().to_owned(), adapter);
    }

    /// Registers an adapter and returns the registry.
    #[must_use]
    pub fn with_adapter(mut self, adapter: impl Adapter + 'static) -> Self {
        self.register(adapter);
        self
    }

    /// Retrieves an adapter by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Adapter>> {
        self.adapters.get(id).cloned()
    }

    /// Returns the registered adapter ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.adapters.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.ids())
            .finish()
    }
}
