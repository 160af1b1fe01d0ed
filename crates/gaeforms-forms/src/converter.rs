//! Property-to-field conversion.
//!
//! A [`ModelConverter`] maps a [`PropertyDef`] to a [`FormFieldDef`] through
//! a table of [`Converter`] callables keyed by property class name. The
//! shared part of every conversion (label, default, required flag, and
//! enumerated choices) happens in [`ModelConverter::convert`] before the
//! table is consulted. The `ndb` and `db` modules fill in the tables.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use gaeforms_core::utils::text::label_from_name;
use gaeforms_core::{FormSettings, SETTINGS};
use gaeforms_datastore::{
    Datastore, KindRegistry, ModelMeta, PropertyDef, PropertyType, Query, Value,
};

use crate::fields::{FormFieldDef, FormFieldType};
use crate::key_field::{KeyChoices, LabelSource};
use crate::validators::{LengthValidator, NumberRangeValidator, Validator};
use crate::widgets::WidgetType;

/// Per-field overrides passed to a converter.
///
/// Every `Some` value wins over what the converter would otherwise derive
/// from the property.
///
/// # Examples
///
/// ```
/// use gaeforms_forms::converter::FieldArgs;
/// use gaeforms_forms::validators::NumberRangeValidator;
///
/// let args = FieldArgs::new()
///     .label("Age")
///     .description("Your age")
///     .validator(NumberRangeValidator::between(14, 99));
/// assert_eq!(args.label.as_deref(), Some("Age"));
/// assert_eq!(args.validators.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldArgs {
    /// Field label.
    pub label: Option<String>,
    /// Help text.
    pub description: Option<String>,
    /// Default value.
    pub default: Option<Value>,
    /// Extra validators.
    pub validators: Vec<Arc<dyn Validator>>,
    /// Allowed values; turns the field into a select.
    pub choices: Option<Vec<Value>>,
    /// strftime format of a date/time field.
    pub format: Option<String>,
    /// Widget override.
    pub widget: Option<WidgetType>,
    /// The type a `GenericProperty` is converted as.
    pub property_type: Option<PropertyType>,
    /// Kind of a key field's options.
    pub reference_kind: Option<String>,
    /// Query listing a key field's options.
    pub query: Option<Arc<dyn Query>>,
    /// Label source of a key field's options.
    pub get_label: Option<LabelSource>,
    /// Whether a key field offers a blank option.
    pub allow_blank: Option<bool>,
    /// Text of a key field's blank option.
    pub blank_text: Option<String>,
    /// Whether a key field runs its query once when built, sharing the
    /// result across form instances.
    pub prefetch: bool,
    /// Whether the field is required.
    pub required: bool,
}

impl FieldArgs {
    /// Creates empty overrides.
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Adds a validator.
    #[must_use]
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Restricts the field to the given values.
    #[must_use]
    pub fn choices<T: Into<Value>>(mut self, choices: impl IntoIterator<Item = T>) -> Self {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the date/time format.
    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Overrides the widget.
    #[must_use]
    pub const fn widget(mut self, widget: WidgetType) -> Self {
        self.widget = Some(widget);
        self
    }

    /// Converts a `GenericProperty` as `property_type`.
    #[must_use]
    pub fn property_type(mut self, property_type: PropertyType) -> Self {
        self.property_type = Some(property_type);
        self
    }

    /// Sets the kind of a key field's options.
    #[must_use]
    pub fn reference_kind(mut self, kind: impl Into<String>) -> Self {
        self.reference_kind = Some(kind.into());
        self
    }

    /// Sets the query of a key field.
    #[must_use]
    pub fn query(mut self, query: Arc<dyn Query>) -> Self {
        self.query = Some(query);
        self
    }

    /// Sets the label source of a key field.
    #[must_use]
    pub fn get_label(mut self, get_label: LabelSource) -> Self {
        self.get_label = Some(get_label);
        self
    }

    /// Sets whether a key field offers a blank option.
    #[must_use]
    pub const fn allow_blank(mut self, allow_blank: bool) -> Self {
        self.allow_blank = Some(allow_blank);
        self
    }

    /// Sets the blank option's text.
    #[must_use]
    pub fn blank_text(mut self, text: impl Into<String>) -> Self {
        self.blank_text = Some(text.into());
        self
    }

    /// Makes a key field fetch its options when built.
    #[must_use]
    pub const fn prefetch(mut self, prefetch: bool) -> Self {
        self.prefetch = prefetch;
        self
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Layers `overrides` on top of these arguments.
    #[must_use]
    pub fn merge(mut self, overrides: &Self) -> Self {
        fn pick<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }
        pick(&mut self.label, &overrides.label);
        pick(&mut self.description, &overrides.description);
        pick(&mut self.default, &overrides.default);
        pick(&mut self.choices, &overrides.choices);
        pick(&mut self.format, &overrides.format);
        pick(&mut self.widget, &overrides.widget);
        pick(&mut self.property_type, &overrides.property_type);
        pick(&mut self.reference_kind, &overrides.reference_kind);
        pick(&mut self.query, &overrides.query);
        pick(&mut self.get_label, &overrides.get_label);
        pick(&mut self.allow_blank, &overrides.allow_blank);
        pick(&mut self.blank_text, &overrides.blank_text);
        self.validators.extend(overrides.validators.iter().cloned());
        self.prefetch |= overrides.prefetch;
        self.required |= overrides.required;
        self
    }

    /// Builds a field of `field_type`, applying the generic arguments.
    pub fn into_field(self, name: &str, field_type: FormFieldType) -> FormFieldDef {
        let mut field = FormFieldDef::new(name, field_type).required(self.required);
        if let Some(label) = self.label {
            field = field.label(label);
        }
        if let Some(description) = self.description {
            field = field.description(description);
        }
        if let Some(widget) = self.widget {
            field = field.widget(widget);
        }
        field.default = self.default;
        field.validators.extend(self.validators);
        field
    }
}

/// What a converter can see besides the property itself.
#[derive(Debug, Clone, Copy)]
pub struct ConversionContext<'a> {
    /// The model declaring the property.
    pub model: &'a ModelMeta,
    /// Form settings in effect.
    pub settings: &'a FormSettings,
    /// Registry used to resolve key property kinds. With no registry every
    /// kind is accepted.
    pub registry: Option<&'a KindRegistry>,
    /// Datastore that key fields query by default.
    pub datastore: Option<&'a dyn Datastore>,
}

impl<'a> ConversionContext<'a> {
    /// Creates a context with no registry and no datastore.
    pub const fn new(model: &'a ModelMeta, settings: &'a FormSettings) -> Self {
        Self {
            model,
            settings,
            registry: None,
            datastore: None,
        }
    }

    /// Sets the kind registry.
    #[must_use]
    pub const fn with_registry(mut self, registry: &'a KindRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the datastore.
    #[must_use]
    pub const fn with_datastore(mut self, datastore: &'a dyn Datastore) -> Self {
        self.datastore = Some(datastore);
        self
    }
}

/// Builds the field for one property, or `None` to leave it out of the form.
pub type Converter =
    Arc<dyn Fn(&ConversionContext<'_>, &PropertyDef, FieldArgs) -> Option<FormFieldDef> + Send + Sync>;

/// Property classes that never get an automatic required flag.
pub const NO_AUTO_REQUIRED: [&str; 3] = ["ListProperty", "StringListProperty", "BooleanProperty"];

/// Converts model properties to form fields.
///
/// # Examples
///
/// ```
/// use gaeforms_core::FormSettings;
/// use gaeforms_datastore::{ModelMeta, PropertyDef, PropertyType};
/// use gaeforms_forms::converter::{ConversionContext, ModelConverter};
/// use gaeforms_forms::fields::FormFieldType;
///
/// let meta = ModelMeta::new("Contact")
///     .property(PropertyDef::new("city_name", PropertyType::String).required());
/// let settings = FormSettings::default();
/// let ctx = ConversionContext::new(&meta, &settings);
///
/// let converter = ModelConverter::ndb();
/// let field = converter.convert(&ctx, &meta.properties[0], None).unwrap();
/// assert_eq!(field.label, "City Name");
/// assert!(field.required);
/// assert!(matches!(field.field_type, FormFieldType::Char { .. }));
/// ```
#[derive(Clone)]
pub struct ModelConverter {
    converters: HashMap<String, Converter>,
    no_auto_required: HashSet<String>,
    multi_select_choices: bool,
    settings: Option<FormSettings>,
    fallback: Converter,
}

impl ModelConverter {
    /// Creates a converter with an empty table.
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
            no_auto_required: NO_AUTO_REQUIRED.iter().map(ToString::to_string).collect(),
            multi_select_choices: false,
            settings: None,
            fallback: Arc::new(skip_unknown),
        }
    }

    /// Creates a converter loaded with the `ndb` table.
    pub fn ndb() -> Self {
        crate::ndb::register(Self::new())
    }

    /// Creates a converter loaded with the `db` table.
    pub fn db() -> Self {
        crate::db::register(Self::new())
    }

    /// Registers or replaces the converter for a property class.
    #[must_use]
    pub fn with_converter(
        mut self,
        type_name: impl Into<String>,
        converter: impl Fn(&ConversionContext<'_>, &PropertyDef, FieldArgs) -> Option<FormFieldDef>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.converters.insert(type_name.into(), Arc::new(converter));
        self
    }

    /// Replaces the converter used for property classes with no table entry.
    #[must_use]
    pub fn with_fallback(
        mut self,
        converter: impl Fn(&ConversionContext<'_>, &PropertyDef, FieldArgs) -> Option<FormFieldDef>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.fallback = Arc::new(converter);
        self
    }

    /// Sets whether a repeated property with choices becomes a multi-select.
    #[must_use]
    pub const fn multi_select_choices(mut self, enabled: bool) -> Self {
        self.multi_select_choices = enabled;
        self
    }

    /// Uses `settings` instead of the global settings.
    #[must_use]
    pub fn with_settings(mut self, settings: FormSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Returns the form settings in effect.
    pub fn settings(&self) -> FormSettings {
        self.settings
            .clone()
            .unwrap_or_else(|| SETTINGS.forms_or_default())
    }

    /// Returns `true` if the table has an entry for `type_name`.
    pub fn has_converter(&self, type_name: &str) -> bool {
        self.converters.contains_key(type_name)
    }

    /// Converts one property.
    ///
    /// Returns `None` if the property has no form representation.
    pub fn convert(
        &self,
        ctx: &ConversionContext<'_>,
        prop: &PropertyDef,
        field_args: Option<&FieldArgs>,
    ) -> Option<FormFieldDef> {
        let mut type_name = prop.type_name().to_string();
        if prop.property_type == PropertyType::Generic {
            if let Some(generic) = field_args.and_then(|a| a.property_type.as_ref()) {
                type_name = generic.type_name().to_string();
            }
        }

        let mut args = FieldArgs::new().label(
            prop.verbose_name
                .clone()
                .unwrap_or_else(|| label_from_name(&prop.name)),
        );
        args.default.clone_from(&prop.default);
        if let Some(overrides) = field_args {
            args = args.merge(overrides);
        }

        if prop.required && !self.no_auto_required.contains(&type_name) {
            args.required = true;
        }

        let choices = args
            .choices
            .take()
            .filter(|c| !c.is_empty())
            .or_else(|| prop.choices.clone())
            .filter(|c| !c.is_empty());
        if let Some(choices) = choices {
            let choices = choices
                .into_iter()
                .map(|v| {
                    let label = v.to_string();
                    (v, label)
                })
                .collect();
            let field_type = if prop.repeated && self.multi_select_choices {
                FormFieldType::MultipleChoice { choices }
            } else {
                FormFieldType::Choice { choices }
            };
            return Some(args.into_field(&prop.name, field_type));
        }

        match self.converters.get(&type_name) {
            Some(converter) => {
                tracing::debug!(property = %prop.name, %type_name, "converting property");
                converter(ctx, prop, args)
            }
            None => (self.fallback)(ctx, prop, args),
        }
    }
}

impl Default for ModelConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModelConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.converters.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ModelConverter")
            .field("converters", &names)
            .field("multi_select_choices", &self.multi_select_choices)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// ── Conversions shared by the ndb and db tables ──────────────────────────

pub(crate) fn string_field(
    ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    args: FieldArgs,
) -> Option<FormFieldDef> {
    let field = args
        .validator(LengthValidator::max(ctx.settings.string_max_length))
        .into_field(
            &prop.name,
            FormFieldType::Char {
                min_length: None,
                max_length: None,
                strip: false,
            },
        );
    Some(field)
}

pub(crate) fn text_field(
    _ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    mut args: FieldArgs,
) -> Option<FormFieldDef> {
    args.widget.get_or_insert(WidgetType::Textarea);
    Some(args.into_field(
        &prop.name,
        FormFieldType::Char {
            min_length: None,
            max_length: None,
            strip: false,
        },
    ))
}

pub(crate) fn integer_field(
    _ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    args: FieldArgs,
) -> Option<FormFieldDef> {
    Some(args.validator(NumberRangeValidator::int64()).into_field(
        &prop.name,
        FormFieldType::Integer {
            min_value: None,
            max_value: None,
        },
    ))
}

pub(crate) fn float_field(
    _ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    args: FieldArgs,
) -> Option<FormFieldDef> {
    Some(args.into_field(
        &prop.name,
        FormFieldType::Float {
            min_value: None,
            max_value: None,
        },
    ))
}

pub(crate) fn boolean_field(
    _ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    args: FieldArgs,
) -> Option<FormFieldDef> {
    Some(args.into_field(&prop.name, FormFieldType::Boolean))
}

pub(crate) fn datetime_field(
    ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    mut args: FieldArgs,
) -> Option<FormFieldDef> {
    if prop.is_auto() {
        return None;
    }
    let format = args
        .format
        .take()
        .unwrap_or_else(|| ctx.settings.datetime_format.clone());
    Some(args.into_field(&prop.name, FormFieldType::DateTime { format }))
}

pub(crate) fn date_field(
    ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    mut args: FieldArgs,
) -> Option<FormFieldDef> {
    if prop.is_auto() {
        return None;
    }
    let format = args
        .format
        .take()
        .unwrap_or_else(|| ctx.settings.date_format.clone());
    Some(args.into_field(&prop.name, FormFieldType::Date { format }))
}

pub(crate) fn time_field(
    ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    mut args: FieldArgs,
) -> Option<FormFieldDef> {
    if prop.is_auto() {
        return None;
    }
    let format = args
        .format
        .take()
        .unwrap_or_else(|| ctx.settings.time_format.clone());
    Some(args.into_field(&prop.name, FormFieldType::Time { format }))
}

pub(crate) fn file_field(
    _ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    args: FieldArgs,
) -> Option<FormFieldDef> {
    Some(args.into_field(
        &prop.name,
        FormFieldType::File {
            max_size: None,
            allowed_extensions: Vec::new(),
        },
    ))
}

pub(crate) fn geopt_field(
    _ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    args: FieldArgs,
) -> Option<FormFieldDef> {
    Some(args.into_field(&prop.name, FormFieldType::GeoPt))
}

pub(crate) fn string_list_field(
    _ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    args: FieldArgs,
) -> Option<FormFieldDef> {
    Some(args.into_field(&prop.name, FormFieldType::StringList))
}

pub(crate) fn skip(
    _ctx: &ConversionContext<'_>,
    _prop: &PropertyDef,
    _args: FieldArgs,
) -> Option<FormFieldDef> {
    None
}

fn skip_unknown(
    _ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    _args: FieldArgs,
) -> Option<FormFieldDef> {
    tracing::debug!(
        property = %prop.name,
        property_type = prop.type_name(),
        "no converter for property type, skipping"
    );
    None
}

/// Builds a key select over entities of `kind`.
pub(crate) fn key_field(
    ctx: &ConversionContext<'_>,
    prop: &PropertyDef,
    mut args: FieldArgs,
    kind: Option<String>,
) -> FormFieldDef {
    let blank_text = args
        .blank_text
        .take()
        .unwrap_or_else(|| ctx.settings.blank_text.clone());
    let mut choices = KeyChoices::new(kind.clone())
        .allow_blank(args.allow_blank.unwrap_or(!prop.required))
        .blank_value(ctx.settings.blank_value.clone())
        .blank_text(blank_text);
    if let Some(get_label) = args.get_label.take() {
        choices = choices.get_label(get_label);
    }
    let query = args.query.take().or_else(|| {
        kind.as_deref()
            .zip(ctx.datastore)
            .map(|(kind, datastore)| datastore.query(kind))
    });
    if let Some(query) = query {
        choices = choices.query(query);
    }
    if args.prefetch {
        choices = choices.prefetch();
    }
    let field_type = if prop.repeated {
        FormFieldType::RepeatedKey(choices)
    } else {
        FormFieldType::Key(choices)
    };
    args.into_field(&prop.name, field_type)
}
