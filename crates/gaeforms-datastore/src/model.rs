//! Model trait and metadata.
//!
//! [`ModelMeta`] is the schema of one kind: its name and declared
//! properties. Form generation only ever looks at a `ModelMeta`; the
//! [`Model`] trait ties a Rust struct to its metadata and converts it to and
//! from an [`Entity`].

use gaeforms_core::GaeResult;

use crate::entity::Entity;
use crate::key::Key;
use crate::property::PropertyDef;

/// Schema of a datastore kind.
///
/// # Examples
///
/// ```
/// use gaeforms_datastore::{ModelMeta, PropertyDef, PropertyType};
///
/// let meta = ModelMeta::new("Author")
///     .property(PropertyDef::new("name", PropertyType::String).required())
///     .property(PropertyDef::new("city", PropertyType::String));
///
/// let names: Vec<_> = meta.properties_in_order().iter().map(|p| p.name.as_str()).collect();
/// assert_eq!(names, ["name", "city"]);
/// assert!(meta.get_property("city").is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMeta {
    /// The kind name.
    pub kind: String,
    /// Declared properties.
    pub properties: Vec<PropertyDef>,
}

impl ModelMeta {
    /// Creates metadata for a kind with no properties.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            properties: Vec::new(),
        }
    }

    /// Creates metadata for `kind` that starts with all of `base`'s
    /// properties, the way a model subclass inherits its parent's.
    pub fn inherit(kind: impl Into<String>, base: &Self) -> Self {
        Self {
            kind: kind.into(),
            properties: base.properties.clone(),
        }
    }

    /// Adds a property. A property with the same name is replaced.
    #[must_use]
    pub fn property(mut self, def: PropertyDef) -> Self {
        self.properties.retain(|p| p.name != def.name);
        self.properties.push(def);
        self
    }

    /// Returns the properties sorted by declaration order.
    pub fn properties_in_order(&self) -> Vec<&PropertyDef> {
        let mut props: Vec<&PropertyDef> = self.properties.iter().collect();
        props.sort_by_key(|p| p.creation_counter);
        props
    }

    /// Looks up a property by name.
    pub fn get_property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A Rust type stored as entities of one kind.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
/// use gaeforms_core::GaeResult;
/// use gaeforms_datastore::{Entity, Key, Model, ModelMeta, PropertyDef, PropertyType};
///
/// struct Author {
///     id: i64,
///     name: String,
/// }
///
/// impl Model for Author {
///     fn meta() -> &'static ModelMeta {
///         static META: LazyLock<ModelMeta> = LazyLock::new(|| {
///             ModelMeta::new("Author").property(PropertyDef::new("name", PropertyType::String))
///         });
///         &META
///     }
///
///     fn key(&self) -> Key {
///         Key::new(Self::kind(), self.id)
///     }
///
///     fn to_entity(&self) -> Entity {
///         Entity::new(self.key()).with("name", self.name.as_str())
///     }
///
///     fn from_entity(entity: &Entity) -> GaeResult<Self> {
///         let name = entity.get("name").and_then(|v| v.as_str()).unwrap_or_default();
///         let id = match entity.key.id() {
///             gaeforms_datastore::KeyId::Int(i) => *i,
///             gaeforms_datastore::KeyId::Name(_) => 0,
///         };
///         Ok(Self { id, name: name.to_string() })
///     }
/// }
///
/// let jane = Author { id: 4, name: "Jane".into() };
/// assert_eq!(jane.to_entity().to_string(), "Author(4)");
/// ```
pub trait Model: Send + Sync + 'static {
    /// Returns the static metadata for this model type.
    fn meta() -> &'static ModelMeta;

    /// Returns the kind name.
    fn kind() -> &'static str {
        &Self::meta().kind
    }

    /// Returns this instance's key.
    fn key(&self) -> Key;

    /// Converts this instance to an entity.
    fn to_entity(&self) -> Entity;

    /// Builds an instance from a stored entity.
    fn from_entity(entity: &Entity) -> GaeResult<Self>
    where
        Self: Sized;
}
