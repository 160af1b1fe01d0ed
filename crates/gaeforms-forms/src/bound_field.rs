//! Bound fields: form fields populated with data and errors.
//!
//! A [`BoundField`] represents the combination of a form field definition,
//! the text its widget shows, any validation errors, and the widget used for
//! rendering. An unbound form builds its bound fields from stored values; a
//! bound form builds them from what was submitted, so a rejected submission
//! is shown back to the user as typed.

use std::collections::HashMap;

use gaeforms_core::utils::text::escape_html;
use gaeforms_datastore::Value;

use crate::fields::{display_value, FormFieldDef, FormFieldType};
use crate::widgets::{self, SelectOption, Widget};

/// A form field bound to data and validation state.
pub struct BoundField {
    /// The field's HTML name attribute, including any form prefix.
    pub name: String,
    /// Snapshot of the field definition.
    pub field: BoundFieldDef,
    /// The text shown by the widget.
    pub data: Option<String>,
    /// Validation error messages for this field.
    pub errors: Vec<String>,
    /// Options of a select widget, with the current selection marked.
    pub options: Vec<SelectOption>,
    /// The widget instance used for rendering.
    pub widget: Box<dyn Widget>,
}

/// Field metadata stored in a `BoundField`.
#[derive(Debug, Clone)]
pub struct BoundFieldDef {
    /// The field name.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Help text.
    pub description: String,
    /// Whether the field is required.
    pub required: bool,
}

impl BoundField {
    /// Binds a field to a stored value.
    pub fn from_value(
        field_def: &FormFieldDef,
        value: &Value,
        errors: Vec<String>,
        prefix: Option<&str>,
    ) -> Self {
        let options = match &field_def.field_type {
            FormFieldType::Key(c) => c.iter_choices(value),
            FormFieldType::RepeatedKey(c) => c.iter_repeated_choices(value),
            FormFieldType::Choice { choices } => choices
                .iter()
                .map(|(v, label)| SelectOption::new(v.to_string(), label.clone(), v == value))
                .collect(),
            FormFieldType::MultipleChoice { choices } => {
                let selected = match value {
                    Value::List(items) => items.as_slice(),
                    _ => &[],
                };
                choices
                    .iter()
                    .map(|(v, label)| {
                        SelectOption::new(v.to_string(), label.clone(), selected.contains(v))
                    })
                    .collect()
            }
            _ => Vec::new(),
        };
        let data = (!value.is_null()).then(|| display_value(field_def, value));
        Self::build(field_def, data, options, errors, prefix)
    }

    /// Binds a field to the raw values submitted for it.
    pub fn from_raw(
        field_def: &FormFieldDef,
        raw: &[String],
        errors: Vec<String>,
        prefix: Option<&str>,
    ) -> Self {
        let options = match &field_def.field_type {
            FormFieldType::Key(c) => c.options_for(raw, true),
            FormFieldType::RepeatedKey(c) => c.options_for(raw, false),
            FormFieldType::Choice { choices } | FormFieldType::MultipleChoice { choices } => {
                choices
                    .iter()
                    .map(|(v, label)| {
                        let value = v.to_string();
                        let selected = raw.contains(&value);
                        SelectOption::new(value, label.clone(), selected)
                    })
                    .collect()
            }
            _ => Vec::new(),
        };
        Self::build(field_def, raw.first().cloned(), options, errors, prefix)
    }

    fn build(
        field_def: &FormFieldDef,
        data: Option<String>,
        options: Vec<SelectOption>,
        errors: Vec<String>,
        prefix: Option<&str>,
    ) -> Self {
        let html_name = match prefix {
            Some(p) => format!("{p}-{}", field_def.name),
            None => field_def.name.clone(),
        };
        let widget = widgets::create_widget(field_def.widget, options.clone());

        Self {
            name: html_name,
            field: BoundFieldDef {
                name: field_def.name.clone(),
                label: field_def.label.clone(),
                description: field_def.description.clone(),
                required: field_def.required,
            },
            data,
            errors,
            options,
            widget,
        }
    }

    /// Renders the widget HTML for this bound field.
    pub fn render(&self, extra_attrs: &HashMap<String, String>) -> String {
        let mut attrs = extra_attrs.clone();
        attrs.entry("id".to_string()).or_insert_with(|| self.auto_id());
        if self.field.required {
            attrs.insert("required".to_string(), "required".to_string());
        }
        self.widget.render(&self.name, self.data.as_deref(), &attrs)
    }

    /// Renders a `<label>` element for this field.
    pub fn label_tag(&self) -> String {
        let label_id = self.widget.id_for_label(&self.auto_id());
        let label = escape_html(&self.field.label);
        if label_id.is_empty() {
            format!("<label>{label}</label>")
        } else {
            format!(r#"<label for="{label_id}">{label}</label>"#)
        }
    }

    /// Returns the auto-generated HTML `id` for this field.
    pub fn auto_id(&self) -> String {
        format!("id_{}", self.name)
    }

    /// Returns `true` if this field has any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Renders the error list as an HTML `<ul>` element.
    pub fn errors_as_ul(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        let items: String = self
            .errors
            .iter()
            .map(|e| format!("<li>{}</li>", escape_html(e)))
            .collect();
        format!(r#"<ul class="errorlist">{items}</ul>"#)
    }

    /// Returns the `(value, label, selected)` options of a select field.
    pub fn choices(&self) -> &[SelectOption] {
        &self.options
    }
}
