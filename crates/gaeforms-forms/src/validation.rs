//! Validation pipeline for form processing.
//!
//! 1. Field-level validation: type coercion plus per-field validators for a
//!    bound form, or a check of the current values for an unbound one
//! 2. Form-level cross-field validation through the async [`Form::clean`]
//!    hook
//!
//! Errors accumulate rather than short-circuiting, so all validation issues
//! are reported at once.

use std::collections::HashMap;

use gaeforms_datastore::Value;

use crate::fields::{clean_field_value, validate_value, FormFieldDef};
use crate::form::Form;

/// Cleans every field from its submitted values.
///
/// A field with no submitted values is cleaned as if it were left empty.
/// Successes go into `cleaned_data`, failures into `errors`.
pub fn clean_fields(
    field_defs: &[FormFieldDef],
    raw_data: &HashMap<String, Vec<String>>,
    cleaned_data: &mut HashMap<String, Value>,
    errors: &mut HashMap<String, Vec<String>>,
) {
    for field in field_defs {
        let raw = raw_data.get(&field.name).map_or(&[][..], Vec::as_slice);
        match clean_field_value(field, raw) {
            Ok(value) => {
                cleaned_data.insert(field.name.clone(), value);
            }
            Err(field_errors) => {
                errors.insert(field.name.clone(), field_errors);
            }
        }
    }
}

/// Checks the current value of every field of an unbound form.
///
/// Values that pass are copied into `cleaned_data` unchanged.
pub fn validate_values(
    field_defs: &[FormFieldDef],
    values: &HashMap<String, Value>,
    cleaned_data: &mut HashMap<String, Value>,
    errors: &mut HashMap<String, Vec<String>>,
) {
    for field in field_defs {
        let value = values.get(&field.name).unwrap_or(&Value::Null);
        match validate_value(field, value) {
            Ok(()) => {
                cleaned_data.insert(field.name.clone(), value.clone());
            }
            Err(field_errors) => {
                errors.insert(field.name.clone(), field_errors);
            }
        }
    }
}

/// Runs the full validation pipeline and returns the errors sorted by field
/// name.
pub async fn full_clean(form: &mut dyn Form) -> Result<(), Vec<(String, Vec<String>)>> {
    if form.is_valid().await {
        return Ok(());
    }
    let mut errors: Vec<(String, Vec<String>)> = form
        .errors()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    errors.sort_by(|a, b| a.0.cmp(&b.0));
    Err(errors)
}
