//! Form generation for `ndb` models.
//!
//! Default conversions:
//!
//! | Property | Field | Notes |
//! |---|---|---|
//! | `StringProperty` | `Char` | at most 500 characters; repeated → `StringList` |
//! | `BooleanProperty` | `Boolean` | |
//! | `IntegerProperty` | `Integer` | 64-bit range; repeated → `IntegerList` |
//! | `FloatProperty` | `Float` | |
//! | `DateTimeProperty` | `DateTime` | skipped if `auto_now[_add]` |
//! | `DateProperty` | `Date` | skipped if `auto_now[_add]` |
//! | `TimeProperty` | `Time` | skipped if `auto_now[_add]` |
//! | `TextProperty` | `Char` | textarea |
//! | `GeoPtProperty` | `GeoPt` | |
//! | `KeyProperty` | `Key` | repeated → `RepeatedKey` |
//! | `JsonProperty` | `Json` | |
//! | `GenericProperty` | `Char` | unless typed through [`FieldArgs::property_type`] |
//! | `BlobKeyProperty` | `File` | |
//! | `UserProperty`, `StructuredProperty`, `LocalStructuredProperty`, `PickleProperty`, `ComputedProperty`, `_ClassKeyProperty` | none | always skipped |
//!
//! A repeated property with choices becomes a multi-select.

use gaeforms_datastore::{ModelMeta, PropertyDef};

use crate::converter::{self, ConversionContext, FieldArgs, ModelConverter};
use crate::fields::{FormFieldDef, FormFieldType};
use crate::form_class::FormClass;
use crate::model_form::{self, ModelFormConfig};

/// Loads the `ndb` table into `converter`.
pub fn register(converter: ModelConverter) -> ModelConverter {
    converter
        .multi_select_choices(true)
        .with_converter("StringProperty", convert_string)
        .with_converter("BooleanProperty", converter::boolean_field)
        .with_converter("IntegerProperty", convert_integer)
        .with_converter("FloatProperty", converter::float_field)
        .with_converter("DateTimeProperty", converter::datetime_field)
        .with_converter("DateProperty", converter::date_field)
        .with_converter("TimeProperty", converter::time_field)
        .with_converter("UserProperty", converter::skip)
        .with_converter("StructuredProperty", converter::skip)
        .with_converter("LocalStructuredProperty", converter::skip)
        .with_converter("JsonProperty", convert_json)
        .with_converter("PickleProperty", converter::skip)
        .with_converter("GenericProperty", converter::string_field)
        .with_converter("BlobKeyProperty", converter::file_field)
        .with_converter("TextProperty", converter::text_field)
        .with_converter("ComputedProperty", converter::skip)
        .with_converter("GeoPtProperty", converter::geopt_field)
        .with_converter("KeyProperty", convert_key)
        .with_converter("_ClassKeyProperty", converter::skip)
}

fn convert_string(
    ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    args: FieldArgs,
) -> Option<FormFieldDef> {
    if prop.repeated {
        return converter::string_list_field(ctx, prop, args);
    }
    converter::string_field(ctx, prop, args)
}

fn convert_integer(
    ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    args: FieldArgs,
) -> Option<FormFieldDef> {
    if prop.repeated {
        return Some(args.into_field(&prop.name, FormFieldType::IntegerList));
    }
    converter::integer_field(ctx, prop, args)
}

fn convert_json(
    _ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    args: FieldArgs,
) -> Option<FormFieldDef> {
    Some(args.into_field(&prop.name, FormFieldType::Json))
}

/// A key property whose kind is named but not registered cannot be edited
/// safely and is left out. Passing both a kind and a query in the field
/// arguments bypasses the lookup.
fn convert_key(
    ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    args: FieldArgs,
) -> Option<FormFieldDef> {
    if args.reference_kind.is_some() && args.query.is_some() {
        let kind = args.reference_kind.clone();
        return Some(converter::key_field(ctx, prop, args, kind));
    }
    let kind = args
        .reference_kind
        .clone()
        .or_else(|| prop.property_type.reference_kind().map(str::to_string));
    if let (Some(kind), Some(registry)) = (kind.as_deref(), ctx.registry) {
        if !registry.contains(kind) {
            tracing::debug!(
                property = %prop.name,
                kind,
                "referenced kind is not registered, skipping"
            );
            return None;
        }
    }
    Some(converter::key_field(ctx, prop, args, kind))
}

/// Returns the form fields of an `ndb` model.
///
/// Uses the `ndb` table unless `config` names a converter.
pub fn model_fields(meta: &ModelMeta, config: &ModelFormConfig) -> Vec<FormFieldDef> {
    model_form::model_fields(meta, &with_table(config))
}

/// Generates a form class for an `ndb` model.
///
/// # Examples
///
/// ```
/// use gaeforms_datastore::{ModelMeta, PropertyDef, PropertyType};
/// use gaeforms_forms::model_form::ModelFormConfig;
/// use gaeforms_forms::ndb;
///
/// let contact = ModelMeta::new("Contact")
///     .property(PropertyDef::new("name", PropertyType::String).required())
///     .property(PropertyDef::new("city", PropertyType::String))
///     .property(PropertyDef::new("age", PropertyType::Integer).required())
///     .property(PropertyDef::new("is_admin", PropertyType::Boolean).default(false));
///
/// let form = ndb::model_form(&contact, &ModelFormConfig::new().exclude(["city", "is_admin"]));
/// assert_eq!(form.name, "ContactForm");
/// assert_eq!(form.field_names(), ["name", "age"]);
/// ```
pub fn model_form(meta: &ModelMeta, config: &ModelFormConfig) -> FormClass {
    model_form::model_form(meta, &with_table(config))
}

fn with_table(config: &ModelFormConfig) -> ModelFormConfig {
    let mut config = config.clone();
    config.converter.get_or_insert_with(ModelConverter::ndb);
    config
}
