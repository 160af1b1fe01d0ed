//! Form field definitions and type-level validation.
//!
//! Each [`FormFieldDef`] describes a single form field, including its type,
//! validators, widget, and metadata. The [`FormFieldType`] enum carries the
//! type-specific parameters, and [`clean_field_value`] turns submitted
//! strings into a typed [`Value`]. [`display_value`] goes the other way,
//! producing the text a widget shows for a stored value.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use gaeforms_core::utils::text::label_from_name;
use gaeforms_datastore::Value;
use regex::Regex;

use crate::key_field::KeyChoices;
use crate::validators::{
    EmailValidator, LengthValidator, NumberRangeValidator, UrlValidator, Validator,
};
use crate::widgets::WidgetType;

/// Defines the type of a form field, including type-specific parameters.
#[derive(Debug, Clone)]
pub enum FormFieldType {
    /// A single-line string.
    Char {
        /// Minimum length (characters).
        min_length: Option<usize>,
        /// Maximum length (characters).
        max_length: Option<usize>,
        /// Whether to strip leading/trailing whitespace.
        strip: bool,
    },
    /// A 64-bit integer.
    Integer {
        /// Minimum allowed value.
        min_value: Option<i64>,
        /// Maximum allowed value.
        max_value: Option<i64>,
    },
    /// A floating-point number.
    Float {
        /// Minimum allowed value.
        min_value: Option<f64>,
        /// Maximum allowed value.
        max_value: Option<f64>,
    },
    /// A checkbox. Only `"false"` and the empty string are false.
    Boolean,
    /// A date parsed with `format`.
    Date {
        /// A `chrono` strftime format.
        format: String,
    },
    /// A date and time parsed with `format`.
    DateTime {
        /// A `chrono` strftime format.
        format: String,
    },
    /// A time of day parsed with `format`.
    Time {
        /// A `chrono` strftime format.
        format: String,
    },
    /// An email address.
    Email,
    /// An absolute URL.
    Url,
    /// One value out of a fixed set.
    Choice {
        /// `(value, label)` pairs. The cleaned value is the matching `Value`.
        choices: Vec<(Value, String)>,
    },
    /// Any number of values out of a fixed set.
    MultipleChoice {
        /// `(value, label)` pairs.
        choices: Vec<(Value, String)>,
    },
    /// A file upload; the cleaned value is the file name.
    File {
        /// Maximum name length in bytes.
        max_size: Option<usize>,
        /// Allowed file extensions (e.g. `["jpg", "png"]`).
        allowed_extensions: Vec<String>,
    },
    /// A JSON document.
    Json,
    /// A geographical point written as `lat,lon`.
    GeoPt,
    /// A list of strings, one per line.
    StringList,
    /// A list of integers, one per line.
    IntegerList,
    /// A select over the entities of a query.
    Key(KeyChoices),
    /// A multiple select over the entities of a query.
    RepeatedKey(KeyChoices),
}

/// Complete definition of a form field.
///
/// # Examples
///
/// ```
/// use gaeforms_forms::fields::{clean_field_value, FormFieldDef, FormFieldType};
/// use gaeforms_forms::validators::NumberRangeValidator;
/// use gaeforms_datastore::Value;
///
/// let age = FormFieldDef::new("age", FormFieldType::Integer { min_value: None, max_value: None })
///     .required(true)
///     .validator(NumberRangeValidator::between(0, 150));
///
/// assert_eq!(age.label, "Age");
/// assert_eq!(clean_field_value(&age, &["42".to_string()]), Ok(Value::Int(42)));
/// assert!(clean_field_value(&age, &["200".to_string()]).is_err());
/// assert!(clean_field_value(&age, &[]).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct FormFieldDef {
    /// The field name (HTML name attribute).
    pub name: String,
    /// The field type, controlling parsing and coercion.
    pub field_type: FormFieldType,
    /// Whether a value must be supplied.
    pub required: bool,
    /// Default value shown when neither an object nor initial data supply one.
    pub default: Option<Value>,
    /// Human-readable label.
    pub label: String,
    /// Help text displayed alongside the field.
    pub description: String,
    /// The widget type used for rendering.
    pub widget: WidgetType,
    /// Additional validators applied after type coercion.
    pub validators: Vec<Arc<dyn Validator>>,
    /// Custom error messages keyed by error code (`required`, `invalid`).
    pub error_messages: HashMap<String, String>,
}

impl FormFieldDef {
    /// Creates an optional field labelled after its name, with the default
    /// widget for its type.
    pub fn new(name: impl Into<String>, field_type: FormFieldType) -> Self {
        let name = name.into();
        let widget = default_widget_for_field_type(&field_type);
        let label = label_from_name(&name);
        Self {
            name,
            field_type,
            required: false,
            default: None,
            label,
            description: String::new(),
            widget,
            validators: Vec::new(),
            error_messages: HashMap::new(),
        }
    }

    /// Sets whether this field is required.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Sets the widget type.
    #[must_use]
    pub const fn widget(mut self, widget: WidgetType) -> Self {
        self.widget = widget;
        self
    }

    /// Adds a validator.
    #[must_use]
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Sets a custom error message for a given code.
    #[must_use]
    pub fn error_message(mut self, code: impl Into<String>, msg: impl Into<String>) -> Self {
        self.error_messages.insert(code.into(), msg.into());
        self
    }

    /// Returns `true` if the cleaned value is always a [`Value::List`].
    pub const fn is_list_valued(&self) -> bool {
        matches!(
            self.field_type,
            FormFieldType::MultipleChoice { .. }
                | FormFieldType::StringList
                | FormFieldType::IntegerList
                | FormFieldType::RepeatedKey(_)
        )
    }

    /// Returns the key choices of a key field.
    pub fn key_choices(&self) -> Option<&KeyChoices> {
        match &self.field_type {
            FormFieldType::Key(c) | FormFieldType::RepeatedKey(c) => Some(c),
            _ => None,
        }
    }

    fn message(&self, code: &str, default: &str) -> String {
        self.error_messages
            .get(code)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn required_message(&self) -> String {
        self.message("required", "This field is required.")
    }

    /// The value of an optional field left empty.
    fn empty_value(&self) -> Value {
        if matches!(self.field_type, FormFieldType::Boolean) {
            Value::Bool(false)
        } else if self.is_list_valued() {
            Value::List(Vec::new())
        } else {
            Value::Null
        }
    }
}

/// Returns the default widget type for a given form field type.
pub const fn default_widget_for_field_type(field_type: &FormFieldType) -> WidgetType {
    match field_type {
        FormFieldType::Char { .. } | FormFieldType::GeoPt => WidgetType::TextInput,
        FormFieldType::Integer { .. } | FormFieldType::Float { .. } => WidgetType::NumberInput,
        FormFieldType::Boolean => WidgetType::CheckboxInput,
        FormFieldType::Date { .. } => WidgetType::DateInput,
        FormFieldType::DateTime { .. } => WidgetType::DateTimeInput,
        FormFieldType::Time { .. } => WidgetType::TimeInput,
        FormFieldType::Email => WidgetType::EmailInput,
        FormFieldType::Url => WidgetType::UrlInput,
        FormFieldType::Choice { .. } | FormFieldType::Key(_) => WidgetType::Select,
        FormFieldType::MultipleChoice { .. } | FormFieldType::RepeatedKey(_) => {
            WidgetType::SelectMultiple
        }
        FormFieldType::File { .. } => WidgetType::FileInput,
        FormFieldType::Json | FormFieldType::StringList | FormFieldType::IntegerList => {
            WidgetType::Textarea
        }
    }
}

/// Cleans (validates and coerces) the raw submitted strings of one field
/// into a typed `Value`.
///
/// 1. Required check (empty or whitespace-only input; the blank option of a
///    key select counts as empty)
/// 2. Key fields are checked against their query
/// 3. Empty optional input yields `false`, `[]` or `Null` by field type
/// 4. Type coercion and type-specific constraints
/// 5. Custom validators, if nothing failed so far
pub fn clean_field_value(field: &FormFieldDef, raw: &[String]) -> Result<Value, Vec<String>> {
    let first = raw.first().map_or("", String::as_str);
    let is_empty = match &field.field_type {
        FormFieldType::Key(c) => first.trim().is_empty() || first == c.blank_value,
        FormFieldType::MultipleChoice { .. } | FormFieldType::RepeatedKey(_) => {
            raw.iter().all(|v| v.trim().is_empty())
        }
        _ => first.trim().is_empty(),
    };

    if field.required && is_empty {
        return Err(vec![field.required_message()]);
    }

    match &field.field_type {
        FormFieldType::Key(c) => {
            return c
                .clean_single(raw.first().map(String::as_str))
                .map_err(|e| vec![e]);
        }
        FormFieldType::RepeatedKey(c) => return c.clean_repeated(raw),
        _ => {}
    }

    if is_empty {
        return Ok(field.empty_value());
    }

    let mut errors = Vec::new();
    let trimmed = first.trim();

    let value = match &field.field_type {
        FormFieldType::Char {
            min_length,
            max_length,
            strip,
        } => {
            let s = if *strip { trimmed } else { first };
            let value = Value::String(s.to_string());
            if min_length.is_some() || max_length.is_some() {
                if let Err(e) = LengthValidator::new(*min_length, *max_length).validate(&value) {
                    errors.push(e.message);
                }
            }
            value
        }

        FormFieldType::Integer {
            min_value,
            max_value,
        } => match parse_integer(trimmed) {
            Ok(n) => {
                let value = Value::Int(n);
                if min_value.is_some() || max_value.is_some() {
                    let range = NumberRangeValidator::new(*min_value, *max_value);
                    if let Err(e) = range.validate(&value) {
                        errors.push(e.message);
                    }
                }
                value
            }
            Err(msg) => {
                errors.push(field.message("invalid", &msg));
                Value::Null
            }
        },

        FormFieldType::Float {
            min_value,
            max_value,
        } => match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => {
                if let Some(min) = min_value {
                    if n < *min {
                        errors.push(format!("Number must be at least {min}."));
                    }
                }
                if let Some(max) = max_value {
                    if n > *max {
                        errors.push(format!("Number must be at most {max}."));
                    }
                }
                Value::Float(n)
            }
            _ => {
                errors.push(field.message("invalid", "Not a valid float value."));
                Value::Null
            }
        },

        FormFieldType::Boolean => Value::Bool(first != "false"),

        FormFieldType::Date { format } => match NaiveDate::parse_from_str(trimmed, format) {
            Ok(d) => Value::Date(d),
            Err(_) => {
                errors.push(field.message("invalid", "Not a valid date value."));
                Value::Null
            }
        },

        FormFieldType::DateTime { format } => {
            match NaiveDateTime::parse_from_str(trimmed, format) {
                Ok(dt) => Value::DateTime(dt),
                Err(_) => {
                    errors.push(field.message("invalid", "Not a valid datetime value."));
                    Value::Null
                }
            }
        }

        FormFieldType::Time { format } => match NaiveTime::parse_from_str(trimmed, format) {
            Ok(t) => Value::Time(t),
            Err(_) => {
                errors.push(field.message("invalid", "Not a valid time value."));
                Value::Null
            }
        },

        FormFieldType::Email => {
            let value = Value::String(trimmed.to_string());
            if let Err(e) = EmailValidator.validate(&value) {
                errors.push(field.message("invalid", &e.message));
            }
            value
        }

        FormFieldType::Url => {
            let value = Value::String(trimmed.to_string());
            if let Err(e) = UrlValidator.validate(&value) {
                errors.push(field.message("invalid", &e.message));
            }
            value
        }

        FormFieldType::Choice { choices } => {
            if let Some((v, _)) = choices.iter().find(|(v, _)| v.to_string() == first) {
                v.clone()
            } else {
                errors.push(field.message("invalid", "Not a valid choice"));
                Value::Null
            }
        }

        FormFieldType::MultipleChoice { choices } => {
            let mut selected = Vec::new();
            for s in raw.iter().filter(|s| !s.is_empty()) {
                match choices.iter().find(|(v, _)| v.to_string() == *s) {
                    Some((v, _)) => selected.push(v.clone()),
                    None => errors.push(format!("'{s}' is not a valid choice for this field.")),
                }
            }
            Value::List(selected)
        }

        FormFieldType::File {
            max_size,
            allowed_extensions,
        } => {
            if let Some(max) = max_size {
                if first.len() > *max {
                    errors.push(format!("File size exceeds maximum of {max} bytes."));
                }
            }
            if !allowed_extensions.is_empty() {
                let ext = first
                    .rsplit('.')
                    .next()
                    .map(str::to_lowercase)
                    .unwrap_or_default();
                if !allowed_extensions.iter().any(|e| e.to_lowercase() == ext) {
                    errors.push(format!(
                        "File extension not allowed. Allowed extensions: {}.",
                        allowed_extensions.join(", ")
                    ));
                }
            }
            Value::String(first.to_string())
        }

        FormFieldType::Json => match serde_json::from_str::<serde_json::Value>(first) {
            Ok(j) => Value::Json(j),
            Err(_) => {
                errors.push(field.message("invalid", "Not valid JSON"));
                Value::Null
            }
        },

        FormFieldType::GeoPt => match parse_geo_pt(first) {
            Some(s) => Value::String(s),
            None => {
                errors.push(field.message("invalid", "Not a valid coordinate location"));
                Value::Null
            }
        },

        FormFieldType::StringList => Value::list(split_lines(first)),

        FormFieldType::IntegerList => {
            let parsed: Result<Vec<i64>, _> =
                split_lines(first).into_iter().map(|l| l.trim().parse()).collect();
            match parsed {
                Ok(ints) => Value::list(ints),
                Err(_) => {
                    errors.push(field.message("invalid", "Not a valid integer list"));
                    Value::Null
                }
            }
        }

        // Handled above.
        FormFieldType::Key(_) | FormFieldType::RepeatedKey(_) => Value::Null,
    };

    if errors.is_empty() {
        run_validators(field, &value, &mut errors);
    }

    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}

/// Validates a value that did not come from a submission: an object's
/// stored value, initial data, or a default. Used when an unbound form is
/// asked whether it is valid.
pub fn validate_value(field: &FormFieldDef, value: &Value) -> Result<(), Vec<String>> {
    let is_empty = match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.trim().is_empty(),
        Value::List(items) => items.is_empty(),
        _ => false,
    };

    if field.required && is_empty {
        return Err(vec![field.required_message()]);
    }

    let mut errors = Vec::new();
    match &field.field_type {
        FormFieldType::Key(c) => {
            if let Err(e) = c.validate_selected(value) {
                errors.extend(e);
            }
        }
        FormFieldType::RepeatedKey(c) if !is_empty => {
            if let Err(e) = c.validate_selected(value) {
                errors.extend(e);
            }
        }
        FormFieldType::Choice { choices } if !value.is_null() => {
            if !choices.iter().any(|(v, _)| v == value) {
                errors.push(field.message("invalid", "Not a valid choice"));
            }
        }
        FormFieldType::MultipleChoice { choices } => {
            if let Value::List(items) = value {
                for item in items {
                    if !choices.iter().any(|(v, _)| v == item) {
                        errors.push(format!("'{item}' is not a valid choice for this field."));
                    }
                }
            }
        }
        _ => {}
    }

    if errors.is_empty() && !value.is_null() {
        run_validators(field, value, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Renders a value as the text a widget displays for it.
pub fn display_value(field: &FormFieldDef, value: &Value) -> String {
    match (&field.field_type, value) {
        (_, Value::Null) => String::new(),
        (FormFieldType::Date { format }, Value::Date(d)) => d.format(format).to_string(),
        (FormFieldType::DateTime { format }, Value::DateTime(dt)) => dt.format(format).to_string(),
        (FormFieldType::Time { format }, Value::Time(t)) => t.format(format).to_string(),
        (_, Value::Key(key)) => key.urlsafe(),
        (_, Value::List(items)) => items
            .iter()
            .map(|v| match v {
                Value::Key(key) => key.urlsafe(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        (FormFieldType::Json, other) => match other {
            Value::Json(j) => j.to_string(),
            Value::String(s) => serde_json::Value::String(s.clone()).to_string(),
            other => other.to_string(),
        },
        (_, other) => other.to_string(),
    }
}

fn run_validators(field: &FormFieldDef, value: &Value, errors: &mut Vec<String>) {
    for validator in &field.validators {
        if let Err(e) = validator.validate(value) {
            errors.push(e.message);
        }
    }
}

/// Parses a 64-bit integer, telling overflow apart from non-numeric input.
fn parse_integer(s: &str) -> Result<i64, String> {
    s.parse::<i64>().map_err(|_| {
        let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            format!("Number must be between {} and {}.", i64::MIN, i64::MAX)
        } else {
            "Not a valid integer value.".to_string()
        }
    })
}

/// Parses `lat,lon` where each side is a decimal literal, returning the
/// normalized `lat,lon` text.
fn parse_geo_pt(s: &str) -> Option<String> {
    static DECIMAL: OnceLock<Regex> = OnceLock::new();
    let re = DECIMAL.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("valid regex")
    });
    let (lat, lon) = s.split_once(',')?;
    if lon.contains(',') {
        return None;
    }
    let normalize = |part: &str| {
        let part = part.trim();
        re.is_match(part)
            .then(|| part.strip_prefix('+').unwrap_or(part).to_string())
    };
    Some(format!("{},{}", normalize(lat)?, normalize(lon)?))
}

/// Splits `text` on `\n`, `\r` and `\r\n`. A trailing line break does not
/// start another line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let Some(end) = rest.find(['\n', '\r']) else {
            lines.push(rest);
            break;
        };
        lines.push(&rest[..end]);
        let width = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[end + width..];
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaeforms_datastore::{Datastore, Entity, Key, MemoryDatastore};

    fn raw(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn char_field(name: &str) -> FormFieldDef {
        FormFieldDef::new(
            name,
            FormFieldType::Char {
                min_length: None,
                max_length: None,
                strip: true,
            },
        )
    }

    fn int_field() -> FormFieldDef {
        FormFieldDef::new(
            "count",
            FormFieldType::Integer {
                min_value: None,
                max_value: None,
            },
        )
    }

    #[test]
    fn test_new_defaults() {
        let field = char_field("first_name");
        assert_eq!(field.label, "First Name");
        assert!(!field.required);
        assert_eq!(field.widget, WidgetType::TextInput);
        assert!(field.default.is_none());
    }

    #[test]
    fn test_char_strip() {
        assert_eq!(
            clean_field_value(&char_field("name"), &raw(&["  Alice  "])),
            Ok(Value::from("Alice"))
        );
    }

    #[test]
    fn test_char_length() {
        let field = FormFieldDef::new(
            "code",
            FormFieldType::Char {
                min_length: Some(2),
                max_length: Some(3),
                strip: false,
            },
        );
        let errs = clean_field_value(&field, &raw(&["abcd"])).unwrap_err();
        assert_eq!(errs, ["Field must be between 2 and 3 characters long."]);
        assert!(clean_field_value(&field, &raw(&["abc"])).is_ok());
    }

    #[test]
    fn test_required() {
        let field = char_field("name").required(true);
        assert_eq!(
            clean_field_value(&field, &raw(&["   "])),
            Err(vec!["This field is required.".to_string()])
        );
        let field = field.error_message("required", "Name please.");
        assert_eq!(
            clean_field_value(&field, &[]),
            Err(vec!["Name please.".to_string()])
        );
    }

    #[test]
    fn test_empty_optional_values() {
        assert_eq!(clean_field_value(&char_field("a"), &[]), Ok(Value::Null));
        let boolean = FormFieldDef::new("b", FormFieldType::Boolean);
        assert_eq!(clean_field_value(&boolean, &[]), Ok(Value::Bool(false)));
        let list = FormFieldDef::new("c", FormFieldType::StringList);
        assert_eq!(clean_field_value(&list, &raw(&[""])), Ok(Value::List(vec![])));
    }

    #[test]
    fn test_integer() {
        assert_eq!(clean_field_value(&int_field(), &raw(&[" 42 "])), Ok(Value::Int(42)));
        assert_eq!(
            clean_field_value(&int_field(), &raw(&["4x"])),
            Err(vec!["Not a valid integer value.".to_string()])
        );
        let errs = clean_field_value(&int_field(), &raw(&["99999999999999999999"])).unwrap_err();
        assert_eq!(
            errs,
            ["Number must be between -9223372036854775808 and 9223372036854775807."]
        );
    }

    #[test]
    fn test_integer_bounds() {
        let field = FormFieldDef::new(
            "n",
            FormFieldType::Integer {
                min_value: Some(1),
                max_value: None,
            },
        );
        assert_eq!(
            clean_field_value(&field, &raw(&["0"])),
            Err(vec!["Number must be at least 1.".to_string()])
        );
    }

    #[test]
    fn test_float() {
        let field = FormFieldDef::new(
            "f",
            FormFieldType::Float {
                min_value: None,
                max_value: Some(1.0),
            },
        );
        assert_eq!(clean_field_value(&field, &raw(&["0.5"])), Ok(Value::Float(0.5)));
        assert_eq!(
            clean_field_value(&field, &raw(&["1.5"])),
            Err(vec!["Number must be at most 1.".to_string()])
        );
        assert_eq!(
            clean_field_value(&field, &raw(&["abc"])),
            Err(vec!["Not a valid float value.".to_string()])
        );
    }

    #[test]
    fn test_boolean() {
        let field = FormFieldDef::new("b", FormFieldType::Boolean);
        assert_eq!(clean_field_value(&field, &raw(&["y"])), Ok(Value::Bool(true)));
        assert_eq!(clean_field_value(&field, &raw(&["false"])), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_dates_use_format() {
        let date = FormFieldDef::new("d", FormFieldType::Date { format: "%d/%m/%Y".into() });
        assert_eq!(
            clean_field_value(&date, &raw(&["25/12/2020"])),
            Ok(Value::Date(NaiveDate::from_ymd_opt(2020, 12, 25).unwrap()))
        );
        assert_eq!(
            clean_field_value(&date, &raw(&["2020-12-25"])),
            Err(vec!["Not a valid date value.".to_string()])
        );
        let dt = FormFieldDef::new(
            "dt",
            FormFieldType::DateTime {
                format: "%Y-%m-%d %H:%M:%S".into(),
            },
        );
        assert!(clean_field_value(&dt, &raw(&["2020-12-25 08:30:00"])).is_ok());
        assert_eq!(
            clean_field_value(&dt, &raw(&["2020-12-25"])),
            Err(vec!["Not a valid datetime value.".to_string()])
        );
        let time = FormFieldDef::new("t", FormFieldType::Time { format: "%H:%M:%S".into() });
        assert_eq!(
            clean_field_value(&time, &raw(&["08:30:00"])),
            Ok(Value::Time(NaiveTime::from_hms_opt(8, 30, 0).unwrap()))
        );
        assert_eq!(
            clean_field_value(&time, &raw(&["8.30"])),
            Err(vec!["Not a valid time value.".to_string()])
        );
    }

    #[test]
    fn test_email_and_url() {
        let email = FormFieldDef::new("e", FormFieldType::Email);
        assert!(clean_field_value(&email, &raw(&["a@example.com"])).is_ok());
        assert_eq!(
            clean_field_value(&email, &raw(&["nope"])),
            Err(vec!["Invalid email address.".to_string()])
        );
        let url = FormFieldDef::new("u", FormFieldType::Url);
        assert_eq!(
            clean_field_value(&url, &raw(&["example"])),
            Err(vec!["Invalid URL.".to_string()])
        );
    }

    #[test]
    fn test_choice_keeps_typed_value() {
        let field = FormFieldDef::new(
            "size",
            FormFieldType::Choice {
                choices: vec![(Value::Int(1), "1".into()), (Value::Int(2), "2".into())],
            },
        );
        assert_eq!(clean_field_value(&field, &raw(&["2"])), Ok(Value::Int(2)));
        assert_eq!(
            clean_field_value(&field, &raw(&["3"])),
            Err(vec!["Not a valid choice".to_string()])
        );
    }

    #[test]
    fn test_multiple_choice() {
        let field = FormFieldDef::new(
            "tags",
            FormFieldType::MultipleChoice {
                choices: vec![(Value::from("a"), "a".into()), (Value::from("b"), "b".into())],
            },
        );
        assert_eq!(
            clean_field_value(&field, &raw(&["b", "a"])),
            Ok(Value::list(["b", "a"]))
        );
        assert_eq!(
            clean_field_value(&field, &raw(&["a", "z"])),
            Err(vec!["'z' is not a valid choice for this field.".to_string()])
        );
    }

    #[test]
    fn test_file_extension() {
        let field = FormFieldDef::new(
            "upload",
            FormFieldType::File {
                max_size: None,
                allowed_extensions: vec!["png".into()],
            },
        );
        assert!(clean_field_value(&field, &raw(&["cat.PNG"])).is_ok());
        assert!(clean_field_value(&field, &raw(&["cat.exe"])).is_err());
    }

    #[test]
    fn test_json() {
        let field = FormFieldDef::new("j", FormFieldType::Json);
        assert_eq!(
            clean_field_value(&field, &raw(&[r#"{"a": [1, 2]}"#])),
            Ok(Value::Json(serde_json::json!({"a": [1, 2]})))
        );
        assert_eq!(
            clean_field_value(&field, &raw(&["{"])),
            Err(vec!["Not valid JSON".to_string()])
        );
    }

    #[test]
    fn test_geo_pt() {
        let field = FormFieldDef::new("location", FormFieldType::GeoPt);
        assert_eq!(
            clean_field_value(&field, &raw(&["5.0, -7.0"])),
            Ok(Value::from("5.0,-7.0"))
        );
        assert_eq!(
            clean_field_value(&field, &raw(&["+1,2e3"])),
            Ok(Value::from("1,2e3"))
        );
        for bad in ["5.0,-f", "5.0", "1,2,3", "a,b"] {
            assert_eq!(
                clean_field_value(&field, &raw(&[bad])),
                Err(vec!["Not a valid coordinate location".to_string()]),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_string_list() {
        let field = FormFieldDef::new("tags", FormFieldType::StringList);
        assert_eq!(
            clean_field_value(&field, &raw(&["foo\r\nbar\nbaz"])),
            Ok(Value::list(["foo", "bar", "baz"]))
        );
    }

    #[test]
    fn test_string_list_splits_on_any_line_break() {
        let field = FormFieldDef::new("tags", FormFieldType::StringList);
        assert_eq!(
            clean_field_value(&field, &raw(&["a\rb\r\nc\n"])),
            Ok(Value::list(["a", "b", "c"]))
        );
        assert_eq!(split_lines("a\n\nb"), ["a", "", "b"]);
    }

    #[test]
    fn test_integer_list() {
        let field = FormFieldDef::new("nums", FormFieldType::IntegerList);
        assert_eq!(
            clean_field_value(&field, &raw(&["1\n 2\r3"])),
            Ok(Value::list([1_i64, 2, 3]))
        );
        assert_eq!(
            clean_field_value(&field, &raw(&["1\ntwo"])),
            Err(vec!["Not a valid integer list".to_string()])
        );
    }

    #[test]
    fn test_validators_skip_after_type_error() {
        let field = int_field().validator(NumberRangeValidator::between(0, 10));
        assert_eq!(
            clean_field_value(&field, &raw(&["x"])),
            Err(vec!["Not a valid integer value.".to_string()])
        );
        assert_eq!(
            clean_field_value(&field, &raw(&["11"])),
            Err(vec!["Number must be between 0 and 10.".to_string()])
        );
    }

    #[test]
    fn test_invalid_message_override() {
        let field = int_field().error_message("invalid", "Whole numbers only.");
        assert_eq!(
            clean_field_value(&field, &raw(&["x"])),
            Err(vec!["Whole numbers only.".to_string()])
        );
    }

    #[test]
    fn test_key_field() {
        let store = MemoryDatastore::new();
        let key = store.put(Entity::new(Key::new("Author", 0))).unwrap();
        let choices = KeyChoices::new(Some("Author".into())).query(store.query("Author"));
        let field = FormFieldDef::new("author", FormFieldType::Key(choices.clone()));
        assert_eq!(field.widget, WidgetType::Select);
        assert_eq!(
            clean_field_value(&field, &[key.urlsafe()]),
            Ok(Value::Key(key.clone()))
        );
        assert_eq!(
            clean_field_value(&field, &raw(&["__None"])),
            Err(vec!["Not a valid choice".to_string()])
        );

        let optional = FormFieldDef::new("author", FormFieldType::Key(choices.allow_blank(true)));
        assert_eq!(clean_field_value(&optional, &raw(&["__None"])), Ok(Value::Null));
        let required = optional.required(true);
        assert_eq!(
            clean_field_value(&required, &raw(&["__None"])),
            Err(vec!["This field is required.".to_string()])
        );
    }

    #[test]
    fn test_validate_value() {
        let field = char_field("name").required(true);
        assert!(validate_value(&field, &Value::Null).is_err());
        assert!(validate_value(&field, &Value::from("x")).is_ok());

        let limited = char_field("name").validator(LengthValidator::max(2));
        assert!(validate_value(&limited, &Value::from("abc")).is_err());
        assert!(validate_value(&limited, &Value::Null).is_ok());

        let choice = FormFieldDef::new(
            "c",
            FormFieldType::Choice {
                choices: vec![(Value::from("a"), "a".into())],
            },
        );
        assert!(validate_value(&choice, &Value::from("a")).is_ok());
        assert!(validate_value(&choice, &Value::from("b")).is_err());
        assert!(validate_value(&choice, &Value::Null).is_ok());
    }

    #[test]
    fn test_validate_value_key() {
        let store = MemoryDatastore::new();
        let inside = store.put(Entity::new(Key::new("Author", 0))).unwrap();
        let choices = KeyChoices::new(None).query(store.query("Author"));
        let field = FormFieldDef::new("author", FormFieldType::Key(choices.clone()));
        assert!(validate_value(&field, &Value::Key(inside.clone())).is_ok());
        assert!(validate_value(&field, &Value::Key(Key::new("Author", 42))).is_err());
        assert!(validate_value(&field, &Value::Null).is_err());

        let repeated = FormFieldDef::new("authors", FormFieldType::RepeatedKey(choices));
        assert!(validate_value(&repeated, &Value::List(vec![])).is_ok());
        assert!(validate_value(&repeated, &Value::list([inside])).is_ok());
    }

    #[test]
    fn test_display_value() {
        let date = FormFieldDef::new("d", FormFieldType::Date { format: "%d/%m/%Y".into() });
        let d = Value::Date(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert_eq!(display_value(&date, &d), "02/01/2020");
        assert_eq!(display_value(&date, &Value::Null), "");

        let list = FormFieldDef::new("tags", FormFieldType::StringList);
        assert_eq!(display_value(&list, &Value::list(["a", "b"])), "a\nb");

        let json = FormFieldDef::new("j", FormFieldType::Json);
        assert_eq!(
            display_value(&json, &Value::Json(serde_json::json!({"a": 1}))),
            r#"{"a":1}"#
        );
        assert_eq!(display_value(&json, &Value::from("x")), r#""x""#);

        let key = Key::new("Author", 3);
        assert_eq!(display_value(&char_field("k"), &Value::Key(key.clone())), key.urlsafe());
        assert_eq!(display_value(&int_field(), &Value::Int(7)), "7");
    }
}
