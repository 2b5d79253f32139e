//! Registry of named producers.

use super::Producer;
use crate::errors::ConfigError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps configured names to producer implementations.
///
/// Backends are chosen by name from configuration, never by inspecting the
/// producer type.
#[derive(Default)]
pub struct ProducerRegistry {
    producers: RwLock<HashMap<String, Arc<dyn Producer>>>,
}

impl ProducerRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a producer under its own name, replacing any previous one.
    pub fn register(&self, producer: Arc<dyn Producer>) {
        let name = producer.name().to_string();
        self.register_as(name, producer);
    }

    /// Registers a producer under an explicit name.
    pub fn register_as(&self, name: impl Into<String>, producer: Arc<dyn Producer>) {
        let name = name.into();
        tracing::debug!(producer = %name, "Registered producer");
        self.producers.write().insert(name, producer);
    }

    /// Looks up a producer by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Producer>, ConfigError> {
        self.producers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownProducer {
                name: name.to_string(),
            })
    }

    /// Returns true if a producer is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.producers.read().contains_key(name)
    }

    /// Lists registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.producers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ProducerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerRegistry")
            .field("producers", &self.names())
            .finish()
    }
}
