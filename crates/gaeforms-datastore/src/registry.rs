//! Kind registry.
//!
//! Key properties may name their target kind as a string. The registry
//! resolves those names to model metadata; a name with no registered model
//! cannot be turned into a form field.

use std::collections::HashMap;
use std::sync::Arc;

use gaeforms_core::{GaeError, GaeResult};

use crate::model::{Model, ModelMeta};

/// Maps kind names to their registered metadata.
///
/// # Examples
///
/// ```
/// use gaeforms_datastore::{KindRegistry, ModelMeta};
///
/// let mut registry = KindRegistry::new();
/// registry.register(ModelMeta::new("Author"));
/// assert!(registry.contains("Author"));
/// assert!(registry.get("Publisher").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    kinds: HashMap<String, Arc<ModelMeta>>,
}

impl KindRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers metadata under its kind name, replacing any previous entry.
    pub fn register(&mut self, meta: ModelMeta) -> &mut Self {
        tracing::debug!(kind = %meta.kind, "registering kind");
        self.kinds.insert(meta.kind.clone(), Arc::new(meta));
        self
    }

    /// Registers the metadata of a [`Model`] type.
    pub fn register_model<M: Model>(&mut self) -> &mut Self {
        self.register(M::meta().clone())
    }

    /// Looks up a kind.
    pub fn get(&self, kind: &str) -> Option<Arc<ModelMeta>> {
        self.kinds.get(kind).cloned()
    }

    /// Looks up a kind, failing with [`GaeError::KindNotRegistered`].
    pub fn resolve(&self, kind: &str) -> GaeResult<Arc<ModelMeta>> {
        self.get(kind)
            .ok_or_else(|| GaeError::KindNotRegistered(kind.to_string()))
    }

    /// Returns `true` if the kind is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Returns the registered kind names, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}
