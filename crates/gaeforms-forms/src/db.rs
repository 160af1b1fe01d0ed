//! Form generation for legacy `db` models.
//!
//! Default conversions:
//!
//! | Property | Field | Notes |
//! |---|---|---|
//! | `StringProperty` | `Char` | at most 500 characters; textarea if multiline |
//! | `ByteStringProperty` | `Char` | at most 500 characters |
//! | `BooleanProperty` | `Boolean` | |
//! | `IntegerProperty` | `Integer` | 64-bit range |
//! | `FloatProperty` | `Float` | |
//! | `DateTimeProperty` | `DateTime` | skipped if `auto_now[_add]` |
//! | `DateProperty` | `Date` | skipped if `auto_now[_add]` |
//! | `TimeProperty` | `Time` | skipped if `auto_now[_add]` |
//! | `StringListProperty` | `StringList` | |
//! | `ReferenceProperty` | `Key` | |
//! | `SelfReferenceProperty` | `Key` | options of the model's own kind |
//! | `BlobProperty` | `File` | |
//! | `TextProperty` | `Char` | textarea |
//! | `CategoryProperty`, `PhoneNumberProperty`, `PostalAddressProperty` | `Char` | at most 500 characters |
//! | `LinkProperty` | `Url` | |
//! | `EmailProperty` | `Email` | |
//! | `GeoPtProperty` | `GeoPt` | |
//! | `RatingProperty` | `Integer` | 0 to 100 |
//! | `ListProperty`, `UserProperty`, `IMProperty` | none | always skipped |

use gaeforms_datastore::{ModelMeta, PropertyDef};

use crate::converter::{self, ConversionContext, FieldArgs, ModelConverter};
use crate::fields::{FormFieldDef, FormFieldType};
use crate::form_class::FormClass;
use crate::model_form::{self, ModelFormConfig};
use crate::validators::NumberRangeValidator;
use crate::widgets::WidgetType;

/// Loads the `db` table into `converter`.
pub fn register(converter: ModelConverter) -> ModelConverter {
    converter
        .with_converter("StringProperty", convert_string)
        .with_converter("ByteStringProperty", converter::string_field)
        .with_converter("BooleanProperty", converter::boolean_field)
        .with_converter("IntegerProperty", converter::integer_field)
        .with_converter("FloatProperty", converter::float_field)
        .with_converter("DateTimeProperty", converter::datetime_field)
        .with_converter("DateProperty", converter::date_field)
        .with_converter("TimeProperty", converter::time_field)
        .with_converter("ListProperty", converter::skip)
        .with_converter("StringListProperty", converter::string_list_field)
        .with_converter("ReferenceProperty", convert_reference)
        .with_converter("SelfReferenceProperty", convert_self_reference)
        .with_converter("UserProperty", converter::skip)
        .with_converter("BlobProperty", converter::file_field)
        .with_converter("TextProperty", converter::text_field)
        .with_converter("CategoryProperty", converter::string_field)
        .with_converter("LinkProperty", convert_link)
        .with_converter("EmailProperty", convert_email)
        .with_converter("GeoPtProperty", converter::geopt_field)
        .with_converter("IMProperty", converter::skip)
        .with_converter("PhoneNumberProperty", converter::string_field)
        .with_converter("PostalAddressProperty", converter::string_field)
        .with_converter("RatingProperty", convert_rating)
}

fn convert_string(
    ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    mut args: FieldArgs,
) -> Option<FormFieldDef> {
    if prop.multiline {
        args.widget.get_or_insert(WidgetType::Textarea);
    }
    converter::string_field(ctx, prop, args)
}

fn convert_reference(
    ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    args: FieldArgs,
) -> Option<FormFieldDef> {
    let kind = args
        .reference_kind
        .clone()
        .or_else(|| prop.property_type.reference_kind().map(str::to_string));
    Some(converter::key_field(ctx, prop, args, kind))
}

fn convert_self_reference(
    ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    args: FieldArgs,
) -> Option<FormFieldDef> {
    let kind = Some(ctx.model.kind.clone());
    Some(converter::key_field(ctx, prop, args, kind))
}

fn convert_link(
    _ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    args: FieldArgs,
) -> Option<FormFieldDef> {
    Some(args.into_field(&prop.name, FormFieldType::Url))
}

fn convert_email(
    _ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    args: FieldArgs,
) -> Option<FormFieldDef> {
    Some(args.into_field(&prop.name, FormFieldType::Email))
}

fn convert_rating(
    _ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    args: FieldArgs,
) -> Option<FormFieldDef> {
    Some(args.validator(NumberRangeValidator::between(0, 100)).into_field(
        &prop.name,
        FormFieldType::Integer {
            min_value: None,
            max_value: None,
        },
    ))
}

/// Returns the form fields of a `db` model.
///
/// Uses the `db` table unless `config` names a converter.
pub fn model_fields(meta: &ModelMeta, config: &ModelFormConfig) -> Vec<FormFieldDef> {
    model_form::model_fields(meta, &with_table(config))
}

/// Generates a form class for a `db` model.
pub fn model_form(meta: &ModelMeta, config: &ModelFormConfig) -> FormClass {
    model_form::model_form(meta, &with_table(config))
}

fn with_table(config: &ModelFormConfig) -> ModelFormConfig {
    let mut config = config.clone();
    config.converter.get_or_insert_with(ModelConverter::db);
    config
}
