//! Stored entities.

use std::collections::BTreeMap;
use std::fmt;

use crate::key::Key;
use crate::value::Value;

/// A stored entity: a key plus its property values.
///
/// Entities are what queries return and what forms read initial data from
/// and write cleaned data back into.
///
/// # Examples
///
/// ```
/// use gaeforms_datastore::{Entity, Key, Value};
///
/// let author = Entity::new(Key::new("Author", 1)).with("name", "Jane");
/// assert_eq!(author.get("name"), Some(&Value::from("Jane")));
/// assert_eq!(author.to_string(), "Author(1)");
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Entity {
    /// The entity's key.
    pub key: Key,
    /// Property values by name.
    pub values: BTreeMap<String, Value>,
}

impl Entity {
    /// Creates an entity with no property values.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            values: BTreeMap::new(),
        }
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Returns the value of a property, if set.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Sets the value of a property.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Returns the kind of this entity.
    pub fn kind(&self) -> &str {
        self.key.kind()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.key.id())
    }
}
