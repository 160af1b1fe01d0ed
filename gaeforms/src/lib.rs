//! # gaeforms
//!
//! Generates HTML forms from App Engine style datastore models.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `gaeforms` to get everything, or on individual crates
//! for finer-grained control.

/// Settings, error types, logging, and text utilities.
pub use gaeforms_core as core;

/// Values, keys, entities, property descriptors, and queries.
pub use gaeforms_datastore as datastore;

/// Form fields, widgets, forms, and model form generation.
#[cfg(feature = "forms")]
pub use gaeforms_forms as forms;

/// Third-party re-exports.
pub use async_trait::async_trait;
pub use chrono;
pub use serde_json;
pub use tracing;
pub use tracing_subscriber;

/// The commonly used types in one import.
pub mod prelude {
    pub use gaeforms_core::{FormSettings, GaeError, GaeResult, Settings, SETTINGS};
    pub use gaeforms_datastore::{
        Datastore, Entity, Key, KindRegistry, MemoryDatastore, ModelMeta, PropertyDef,
        PropertyType, Query, Value,
    };

    #[cfg(feature = "forms")]
    pub use gaeforms_forms::{
        db, ndb, BaseForm, FieldArgs, Form, FormClass, FormData, FormFieldDef, FormFieldType,
        KeyChoices, LabelSource, ModelConverter, ModelFormConfig, ModelFormFields,
    };
}
