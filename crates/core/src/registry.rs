//! Runtime adapter registry
//!
//! The orchestrator registers one adapter per language and asks the registry
//! which adapter handles a function's runtime identifier. Adapters are
//! consulted in registration order and the first match wins.

use std::sync::Arc;

use crate::runtime::{Runtime, RustRuntime};

#[derive(Default)]
pub struct RuntimeRegistry {
    runtimes: Vec<Arc<dyn Runtime>>,
}

impl RuntimeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the adapters this crate provides
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(RustRuntime::new());
        registry
    }

    pub fn register<R: Runtime + 'static>(&mut self, runtime: R) -> &mut Self {
        self.runtimes.push(Arc::new(runtime));
        self
    }

    pub fn register_shared(&mut self, runtime: Arc<dyn Runtime>) -> &mut Self {
        self.runtimes.push(runtime);
        self
    }

    /// First registered adapter that handles `runtime`
    pub fn resolve(&self, runtime: &str) -> Option<Arc<dyn Runtime>> {
        let found = self.runtimes.iter().find(|r| r.matches(runtime)).cloned();
        if found.is_none() {
            tracing::debug!(runtime, "no adapter registered for runtime");
        }
        found
    }

    pub fn len(&self) -> usize {
        self.runtimes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runtimes.is_empty()
    }
}

impl std::fmt::Debug for RuntimeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeRegistry")
            .field("runtimes", &self.runtimes.len())
            .finish()
    }
}
