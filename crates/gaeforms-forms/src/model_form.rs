//! Model form generation.
//!
//! [`model_fields`] converts the properties of a [`ModelMeta`] into form
//! field definitions, and [`model_form`] wraps them in a [`FormClass`] named
//! after the kind. A [`ModelFormConfig`] selects the properties, supplies
//! per-field overrides, and provides the registry and datastore that key
//! fields need.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use gaeforms_core::logging::model_form_span;
use gaeforms_datastore::{Datastore, KindRegistry, ModelMeta, PropertyDef};

use crate::converter::{ConversionContext, FieldArgs, ModelConverter};
use crate::fields::FormFieldDef;
use crate::form_class::FormClass;

/// Specifies which properties get a form field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModelFormFields {
    /// Every property, in declaration order.
    #[default]
    All,
    /// Only the listed properties, in list order. Unknown and repeated
    /// names are ignored; an empty list selects every property.
    Include(Vec<String>),
    /// Every property except the listed ones.
    Exclude(Vec<String>),
}

/// Configuration for model form generation.
#[derive(Debug, Clone, Default)]
pub struct ModelFormConfig {
    /// Which properties to include.
    pub fields: ModelFormFields,
    /// Per-property overrides, keyed by property name.
    pub field_args: HashMap<String, FieldArgs>,
    /// The converter to use. The entry points of the `ndb` and `db` modules
    /// fill this in with their own table.
    pub converter: Option<ModelConverter>,
    /// Registry used to resolve key property kinds.
    pub registry: Option<KindRegistry>,
    /// Datastore queried for key field options.
    pub datastore: Option<Arc<dyn Datastore>>,
    /// Form class whose fields come first.
    pub base: Option<FormClass>,
    /// Fields added after the model fields.
    pub extra_fields: Vec<FormFieldDef>,
}

impl ModelFormConfig {
    /// Creates a configuration that includes every property.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the field selection.
    #[must_use]
    pub fn with_fields(mut self, fields: ModelFormFields) -> Self {
        self.fields = fields;
        self
    }

    /// Includes only the named properties.
    #[must_use]
    pub fn only<S: Into<String>>(self, names: impl IntoIterator<Item = S>) -> Self {
        self.with_fields(ModelFormFields::Include(
            names.into_iter().map(Into::into).collect(),
        ))
    }

    /// Leaves out the named properties.
    #[must_use]
    pub fn exclude<S: Into<String>>(self, names: impl IntoIterator<Item = S>) -> Self {
        self.with_fields(ModelFormFields::Exclude(
            names.into_iter().map(Into::into).collect(),
        ))
    }

    /// Sets the overrides of one property.
    #[must_use]
    pub fn with_field_args(mut self, name: impl Into<String>, args: FieldArgs) -> Self {
        self.field_args.insert(name.into(), args);
        self
    }

    /// Sets the converter.
    #[must_use]
    pub fn with_converter(mut self, converter: ModelConverter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Sets the kind registry.
    #[must_use]
    pub fn with_registry(mut self, registry: KindRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the datastore.
    #[must_use]
    pub fn with_datastore(mut self, datastore: Arc<dyn Datastore>) -> Self {
        self.datastore = Some(datastore);
        self
    }

    /// Sets the base form class.
    #[must_use]
    pub fn with_base(mut self, base: FormClass) -> Self {
        self.base = Some(base);
        self
    }

    /// Adds a field that has no model property behind it.
    #[must_use]
    pub fn with_extra_field(mut self, field: FormFieldDef) -> Self {
        self.extra_fields.push(field);
        self
    }

    fn selected<'m>(&self, meta: &'m ModelMeta) -> Vec<&'m PropertyDef> {
        match &self.fields {
            ModelFormFields::Include(names) if !names.is_empty() => {
                let mut seen = HashSet::new();
                names
                    .iter()
                    .filter(|name| seen.insert(name.as_str()))
                    .filter_map(|name| meta.get_property(name))
                    .collect()
            }
            ModelFormFields::All | ModelFormFields::Include(_) => meta.properties_in_order(),
            ModelFormFields::Exclude(names) => meta
                .properties_in_order()
                .into_iter()
                .filter(|p| !names.contains(&p.name))
                .collect(),
        }
    }
}

/// Converts the selected properties of `meta` into field definitions.
///
/// Properties the converter has no field for are left out. Without a
/// configured converter the `ndb` table is used.
pub fn model_fields(meta: &ModelMeta, config: &ModelFormConfig) -> Vec<FormFieldDef> {
    let default_converter;
    let converter = match &config.converter {
        Some(converter) => converter,
        None => {
            default_converter = ModelConverter::ndb();
            &default_converter
        }
    };
    let settings = converter.settings();
    let mut ctx = ConversionContext::new(meta, &settings);
    if let Some(registry) = &config.registry {
        ctx = ctx.with_registry(registry);
    }
    if let Some(datastore) = &config.datastore {
        ctx = ctx.with_datastore(datastore.as_ref());
    }

    config
        .selected(meta)
        .into_iter()
        .filter_map(|prop| {
            let field = converter.convert(&ctx, prop, config.field_args.get(&prop.name));
            if field.is_none() {
                tracing::debug!(property = %prop.name, "property has no form field");
            }
            field
        })
        .collect()
}

/// Generates a form class named `"<Kind>Form"`.
///
/// The class holds the base class fields, then the model fields, then the
/// extra fields. A later field replaces an earlier one of the same name in
/// place.
///
/// # Examples
///
/// ```
/// use gaeforms_datastore::{ModelMeta, PropertyDef, PropertyType};
/// use gaeforms_forms::converter::FieldArgs;
/// use gaeforms_forms::fields::{FormFieldDef, FormFieldType};
/// use gaeforms_forms::model_form::{model_form, ModelFormConfig};
///
/// let contact = ModelMeta::new("Contact")
///     .property(PropertyDef::new("name", PropertyType::String).required())
///     .property(PropertyDef::new("age", PropertyType::Integer));
///
/// let config = ModelFormConfig::new()
///     .only(["age", "name"])
///     .with_field_args("name", FieldArgs::new().label("Full name"))
///     .with_extra_field(FormFieldDef::new("subscribe", FormFieldType::Boolean));
///
/// let form = model_form(&contact, &config);
/// assert_eq!(form.field_names(), ["age", "name", "subscribe"]);
/// assert_eq!(form.field("name").unwrap().label, "Full name");
/// ```
pub fn model_form(meta: &ModelMeta, config: &ModelFormConfig) -> FormClass {
    let span = model_form_span(&meta.kind);
    let _guard = span.enter();

    let mut form = FormClass::new(format!("{}Form", meta.kind));
    for field in model_fields(meta, config) {
        form = form.with_field(field);
    }
    for field in &config.extra_fields {
        form = form.with_field(field.clone());
    }
    if let Some(base) = &config.base {
        form = form.extend(base);
    }
    tracing::debug!(form = %form.name, fields = form.fields.len(), "generated model form");
    form
}
