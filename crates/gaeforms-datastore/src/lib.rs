//! # gaeforms-datastore
//!
//! The datastore side of gaeforms: the schema and value model that form
//! generation reads from.
//!
//! ## Modules
//!
//! - [`value`] - Backend-agnostic property values, including [`GeoPt`](value::GeoPt)
//! - [`key`] - Entity keys and their urlsafe encoding
//! - [`entity`] - Stored entities (a key plus property values)
//! - [`property`] - Property descriptors for both the `ndb` and `db` model APIs
//! - [`model`] - Model metadata and the [`Model`](model::Model) trait
//! - [`registry`] - The kind registry used to resolve string references
//! - [`query`] - Query and datastore traits plus an in-memory datastore

pub mod entity;
pub mod key;
pub mod model;
pub mod property;
pub mod query;
pub mod registry;
pub mod value;

pub use entity::Entity;
pub use key::{Key, KeyId};
pub use model::{Model, ModelMeta};
pub use property::{PropertyDef, PropertyType};
pub use query::{Datastore, FilterOp, KindQuery, MemoryDatastore, Query};
pub use registry::KindRegistry;
pub use value::{GeoPt, Value};
