//! Queries and datastores.
//!
//! Key fields list their choices by running a [`Query`]. Any backend can
//! supply one by implementing [`Datastore`]; [`MemoryDatastore`] is the
//! in-process implementation used by tests and small applications.

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use gaeforms_core::{GaeError, GaeResult};

use crate::entity::Entity;
use crate::key::{Key, KeyId};
use crate::value::Value;

/// A query that produces entities.
pub trait Query: Send + Sync + fmt::Debug {
    /// The kind this query is restricted to, if any.
    fn kind(&self) -> Option<&str>;

    /// Runs the query.
    fn fetch(&self) -> GaeResult<Vec<Entity>>;
}

/// A source of queries.
pub trait Datastore: Send + Sync + fmt::Debug {
    /// Returns a query over all entities of `kind`.
    fn query(&self, kind: &str) -> Arc<dyn Query>;
}

/// Comparison used by [`KindQuery::filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Property equals the value.
    Eq,
    /// Property does not equal the value.
    Ne,
}

#[derive(Debug, Default)]
struct StoreInner {
    entities: Vec<Entity>,
    next_id: i64,
}

/// An in-memory datastore.
///
/// Entities are kept in insertion order. Cloning shares the same storage.
///
/// # Examples
///
/// ```
/// use gaeforms_datastore::{Datastore, Entity, Key, MemoryDatastore};
///
/// let store = MemoryDatastore::new();
/// let key = store.put(Entity::new(Key::new("Author", 0)).with("name", "Jane")).unwrap();
/// assert!(key.is_complete());
///
/// let authors = store.query("Author").fetch().unwrap();
/// assert_eq!(authors.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDatastore {
    inner: Arc<RwLock<StoreInner>>,
}

impl MemoryDatastore {
    /// Creates an empty datastore.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an entity and returns its key.
    ///
    /// An incomplete key (numeric id 0) is given the next free id. An
    /// entity with the same key as a stored one replaces it in place.
    pub fn put(&self, mut entity: Entity) -> GaeResult<Key> {
        let mut inner = self.write()?;
        if entity.key.is_complete() {
            if let KeyId::Int(id) = entity.key.id() {
                inner.next_id = inner.next_id.max(*id);
            }
        } else {
            inner.next_id += 1;
            entity.key = entity.key.with_id(inner.next_id);
        }
        let key = entity.key.clone();
        if let Some(existing) = inner.entities.iter_mut().find(|e| e.key == key) {
            *existing = entity;
        } else {
            inner.entities.push(entity);
        }
        tracing::trace!(key = %key, "put entity");
        Ok(key)
    }

    /// Fetches an entity by key.
    pub fn get(&self, key: &Key) -> GaeResult<Option<Entity>> {
        Ok(self.read()?.entities.iter().find(|e| &e.key == key).cloned())
    }

    /// Deletes an entity. Returns `true` if it existed.
    pub fn delete(&self, key: &Key) -> GaeResult<bool> {
        let mut inner = self.write()?;
        let before = inner.entities.len();
        inner.entities.retain(|e| &e.key != key);
        Ok(inner.entities.len() != before)
    }

    /// Returns the number of stored entities.
    pub fn len(&self) -> GaeResult<usize> {
        Ok(self.read()?.entities.len())
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> GaeResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns a filterable query over `kind`.
    pub fn kind_query(&self, kind: impl Into<String>) -> KindQuery {
        KindQuery {
            store: self.clone(),
            kind: kind.into(),
            filters: Vec::new(),
        }
    }

    fn read(&self) -> GaeResult<RwLockReadGuard<'_, StoreInner>> {
        self.inner
            .read()
            .map_err(|e| GaeError::DatastoreError(format!("store lock poisoned: {e}")))
    }

    fn write(&self) -> GaeResult<RwLockWriteGuard<'_, StoreInner>> {
        self.inner
            .write()
            .map_err(|e| GaeError::DatastoreError(format!("store lock poisoned: {e}")))
    }
}

impl Datastore for MemoryDatastore {
    fn query(&self, kind: &str) -> Arc<dyn Query> {
        Arc::new(self.kind_query(kind))
    }
}

/// A query over one kind of a [`MemoryDatastore`], with optional property
/// filters.
///
/// Filters are evaluated when the query runs, so a query built once sees
/// entities stored later.
#[derive(Debug, Clone)]
pub struct KindQuery {
    store: MemoryDatastore,
    kind: String,
    filters: Vec<(String, FilterOp, Value)>,
}

impl KindQuery {
    /// Adds a property filter. A missing property compares as `Null`.
    #[must_use]
    pub fn filter(
        mut self,
        property: impl Into<String>,
        op: FilterOp,
        value: impl Into<Value>,
    ) -> Self {
        self.filters.push((property.into(), op, value.into()));
        self
    }

    fn matches(&self, entity: &Entity) -> bool {
        entity.kind() == self.kind
            && self.filters.iter().all(|(prop, op, value)| {
                let actual = entity.get(prop).unwrap_or(&Value::Null);
                match op {
                    FilterOp::Eq => actual == value,
                    FilterOp::Ne => actual != value,
                }
            })
    }
}

impl Query for KindQuery {
    fn kind(&self) -> Option<&str> {
        Some(&self.kind)
    }

    fn fetch(&self) -> GaeResult<Vec<Entity>> {
        let inner = self.store.read()?;
        Ok(inner
            .entities
            .iter()
            .filter(|e| self.matches(e))
            .cloned()
            .collect())
    }
}
