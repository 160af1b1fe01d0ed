//! Widget system for rendering HTML form elements.
//!
//! Widgets are the bridge between form fields and their HTML representation.
//! Each widget knows how to render itself as HTML, extract the raw values
//! from submitted [`FormData`], and generate the `id` its `<label>` points
//! at.

use std::collections::HashMap;
use std::fmt;

use gaeforms_core::utils::text::escape_html;

use crate::form_data::FormData;

/// Enumerates the built-in widget types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetType {
    /// `<input type="text">`.
    TextInput,
    /// `<input type="number">`.
    NumberInput,
    /// `<input type="email">`.
    EmailInput,
    /// `<input type="url">`.
    UrlInput,
    /// `<textarea>`.
    Textarea,
    /// `<input type="checkbox">`.
    CheckboxInput,
    /// `<select>`.
    Select,
    /// `<select multiple>`.
    SelectMultiple,
    /// `<input type="date">`.
    DateInput,
    /// `<input type="datetime-local">`.
    DateTimeInput,
    /// `<input type="time">`.
    TimeInput,
    /// `<input type="file">`.
    FileInput,
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::NumberInput => "NumberInput",
            Self::EmailInput => "EmailInput",
            Self::UrlInput => "UrlInput",
            Self::Textarea => "Textarea",
            Self::CheckboxInput => "CheckboxInput",
            Self::Select => "Select",
            Self::SelectMultiple => "SelectMultiple",
            Self::DateInput => "DateInput",
            Self::DateTimeInput => "DateTimeInput",
            Self::TimeInput => "TimeInput",
            Self::FileInput => "FileInput",
        };
        write!(f, "{name}")
    }
}

/// One `<option>` of a select widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    /// The submitted value.
    pub value: String,
    /// The displayed text.
    pub label: String,
    /// Whether the option is currently selected.
    pub selected: bool,
}

impl SelectOption {
    /// Creates an option.
    pub fn new(value: impl Into<String>, label: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            selected,
        }
    }

    fn render(&self) -> String {
        let selected = if self.selected { " selected" } else { "" };
        format!(
            r#"<option value="{}"{selected}>{}</option>"#,
            escape_html(&self.value),
            escape_html(&self.label)
        )
    }
}

/// A trait for HTML form widgets.
///
/// All widgets must be `Send + Sync` so forms can be validated on any
/// thread.
pub trait Widget: Send + Sync + fmt::Debug {
    /// Returns the widget type.
    fn widget_type(&self) -> WidgetType;

    /// Renders the widget as an HTML string.
    ///
    /// # Arguments
    /// - `name` - The HTML `name` attribute
    /// - `value` - The text to display, if any
    /// - `attrs` - Additional HTML attributes
    fn render(&self, name: &str, value: Option<&str>, attrs: &HashMap<String, String>) -> String;

    /// Extracts the raw values submitted under `name`.
    ///
    /// Returns an empty vector when nothing was submitted.
    fn value_from_data(&self, data: &FormData, name: &str) -> Vec<String> {
        data.get(name).map(|v| vec![v.to_string()]).unwrap_or_default()
    }

    /// Returns the HTML `id` attribute value for a label targeting this widget.
    fn id_for_label(&self, id: &str) -> String {
        id.to_string()
    }
}

/// Formats an attribute map as ` key="value" key2="value2"`, sorted by key.
fn render_attrs(attrs: &HashMap<String, String>) -> String {
    let mut parts: Vec<String> = attrs
        .iter()
        .map(|(k, v)| format!(r#" {k}="{}""#, escape_html(v)))
        .collect();
    parts.sort();
    parts.join("")
}

/// An `<input>` element of a fixed type.
#[derive(Debug, Clone, Copy)]
pub struct Input {
    widget_type: WidgetType,
    input_type: &'static str,
}

impl Input {
    /// `<input type="text">`.
    pub const fn text() -> Self {
        Self::of(WidgetType::TextInput, "text")
    }

    /// `<input type="number">`.
    pub const fn number() -> Self {
        Self::of(WidgetType::NumberInput, "number")
    }

    /// `<input type="email">`.
    pub const fn email() -> Self {
        Self::of(WidgetType::EmailInput, "email")
    }

    /// `<input type="url">`.
    pub const fn url() -> Self {
        Self::of(WidgetType::UrlInput, "url")
    }

    /// `<input type="date">`.
    pub const fn date() -> Self {
        Self::of(WidgetType::DateInput, "date")
    }

    /// `<input type="datetime-local">`.
    pub const fn datetime() -> Self {
        Self::of(WidgetType::DateTimeInput, "datetime-local")
    }

    /// `<input type="time">`.
    pub const fn time() -> Self {
        Self::of(WidgetType::TimeInput, "time")
    }

    /// `<input type="file">`.
    pub const fn file() -> Self {
        Self::of(WidgetType::FileInput, "file")
    }

    const fn of(widget_type: WidgetType, input_type: &'static str) -> Self {
        Self {
            widget_type,
            input_type,
        }
    }
}

impl Widget for Input {
    fn widget_type(&self) -> WidgetType {
        self.widget_type
    }

    fn render(&self, name: &str, value: Option<&str>, attrs: &HashMap<String, String>) -> String {
        // File inputs never echo a value back.
        let val = if self.widget_type == WidgetType::FileInput {
            ""
        } else {
            value.unwrap_or("")
        };
        format!(
            r#"<input type="{}" name="{name}" value="{}"{} />"#,
            self.input_type,
            escape_html(val),
            render_attrs(attrs)
        )
    }
}

/// A `<textarea>` widget.
#[derive(Debug, Clone, Copy, Default)]
pub struct Textarea;

impl Widget for Textarea {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Textarea
    }

    fn render(&self, name: &str, value: Option<&str>, attrs: &HashMap<String, String>) -> String {
        format!(
            r#"<textarea name="{name}"{}>{}</textarea>"#,
            render_attrs(attrs),
            escape_html(value.unwrap_or(""))
        )
    }
}

/// A `<input type="checkbox">` widget.
///
/// The box is checked for any value other than empty or `"false"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckboxInput;

impl Widget for CheckboxInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::CheckboxInput
    }

    fn render(&self, name: &str, value: Option<&str>, attrs: &HashMap<String, String>) -> String {
        let checked = value.is_some_and(|v| !v.is_empty() && v != "false");
        let checked_attr = if checked { " checked" } else { "" };
        format!(
            r#"<input type="checkbox" name="{name}" value="y"{checked_attr}{} />"#,
            render_attrs(attrs)
        )
    }
}

/// A `<select>` widget.
#[derive(Debug, Clone, Default)]
pub struct Select {
    /// The options, in display order.
    pub options: Vec<SelectOption>,
}

impl Select {
    /// Creates a `Select` widget with the given options.
    pub fn new(options: Vec<SelectOption>) -> Self {
        Self { options }
    }
}

impl Widget for Select {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Select
    }

    fn render(&self, name: &str, value: Option<&str>, attrs: &HashMap<String, String>) -> String {
        let any_selected = self.options.iter().any(|o| o.selected);
        let options: String = self
            .options
            .iter()
            .map(|o| {
                if !any_selected && value == Some(o.value.as_str()) {
                    SelectOption::new(o.value.clone(), o.label.clone(), true).render()
                } else {
                    o.render()
                }
            })
            .collect();
        format!(r#"<select name="{name}"{}>{options}</select>"#, render_attrs(attrs))
    }
}

/// A `<select multiple>` widget.
#[derive(Debug, Clone, Default)]
pub struct SelectMultiple {
    /// The options, in display order.
    pub options: Vec<SelectOption>,
}

impl SelectMultiple {
    /// Creates a `SelectMultiple` widget with the given options.
    pub fn new(options: Vec<SelectOption>) -> Self {
        Self { options }
    }
}

impl Widget for SelectMultiple {
    fn widget_type(&self) -> WidgetType {
        WidgetType::SelectMultiple
    }

    fn render(&self, name: &str, _value: Option<&str>, attrs: &HashMap<String, String>) -> String {
        let options: String = self.options.iter().map(SelectOption::render).collect();
        format!(
            r#"<select multiple name="{name}"{}>{options}</select>"#,
            render_attrs(attrs)
        )
    }

    fn value_from_data(&self, data: &FormData, name: &str) -> Vec<String> {
        data.get_list(name).to_vec()
    }
}

/// Creates a boxed widget from a `WidgetType`. Select widgets get `options`;
/// other widgets ignore them.
pub fn create_widget(widget_type: WidgetType, options: Vec<SelectOption>) -> Box<dyn Widget> {
    match widget_type {
        WidgetType::TextInput => Box::new(Input::text()),
        WidgetType::NumberInput => Box::new(Input::number()),
        WidgetType::EmailInput => Box::new(Input::email()),
        WidgetType::UrlInput => Box::new(Input::url()),
        WidgetType::Textarea => Box::new(Textarea),
        WidgetType::CheckboxInput => Box::new(CheckboxInput),
        WidgetType::Select => Box::new(Select::new(options)),
        WidgetType::SelectMultiple => Box::new(SelectMultiple::new(options)),
        WidgetType::DateInput => Box::new(Input::date()),
        WidgetType::DateTimeInput => Box::new(Input::datetime()),
        WidgetType::TimeInput => Box::new(Input::time()),
        WidgetType::FileInput => Box::new(Input::file()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_attrs() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_text_input_render() {
        let html = Input::text().render("name", Some("Alice"), &empty_attrs());
        assert_eq!(html, r#"<input type="text" name="name" value="Alice" />"#);
    }

    #[test]
    fn test_input_escapes_value() {
        let html = Input::text().render("q", Some(r#"<b>"x"</b>"#), &empty_attrs());
        assert!(html.contains(r#"value="&lt;b&gt;&quot;x&quot;&lt;/b&gt;""#));
    }

    #[test]
    fn test_attrs_sorted() {
        let mut attrs = empty_attrs();
        attrs.insert("id".into(), "id_age".into());
        attrs.insert("class".into(), "wide".into());
        let html = Input::number().render("age", None, &attrs);
        assert_eq!(
            html,
            r#"<input type="number" name="age" value="" class="wide" id="id_age" />"#
        );
    }

    #[test]
    fn test_file_input_drops_value() {
        let html = Input::file().render("upload", Some("secret.txt"), &empty_attrs());
        assert!(html.contains(r#"value="""#));
        assert_eq!(Input::file().widget_type(), WidgetType::FileInput);
    }

    #[test]
    fn test_textarea_render() {
        let html = Textarea.render("tags", Some("a\nb"), &empty_attrs());
        assert_eq!(html, "<textarea name=\"tags\">a\nb</textarea>");
    }

    #[test]
    fn test_checkbox() {
        assert!(CheckboxInput
            .render("ok", Some("true"), &empty_attrs())
            .contains(" checked"));
        assert!(!CheckboxInput
            .render("ok", Some("false"), &empty_attrs())
            .contains(" checked"));
        assert!(!CheckboxInput.render("ok", None, &empty_attrs()).contains(" checked"));
    }

    #[test]
    fn test_select_marks_value() {
        let select = Select::new(vec![
            SelectOption::new("a", "A", false),
            SelectOption::new("b", "B", false),
        ]);
        let html = select.render("letter", Some("b"), &empty_attrs());
        assert_eq!(
            html,
            r#"<select name="letter"><option value="a">A</option><option value="b" selected>B</option></select>"#
        );
    }

    #[test]
    fn test_select_prefers_option_flags() {
        let select = Select::new(vec![
            SelectOption::new("a", "A", true),
            SelectOption::new("b", "B", false),
        ]);
        let html = select.render("letter", Some("b"), &empty_attrs());
        assert!(html.contains(r#"<option value="a" selected>"#));
        assert!(html.contains(r#"<option value="b">"#));
    }

    #[test]
    fn test_select_multiple_reads_all_values() {
        let data = FormData::from_pairs([("tags", "x"), ("tags", "y")]);
        let widget = SelectMultiple::default();
        assert_eq!(widget.value_from_data(&data, "tags"), ["x", "y"]);
        assert_eq!(Textarea.value_from_data(&data, "tags"), ["x"]);
        assert!(Textarea.value_from_data(&data, "missing").is_empty());
    }

    #[test]
    fn test_create_widget() {
        for wt in [
            WidgetType::TextInput,
            WidgetType::NumberInput,
            WidgetType::EmailInput,
            WidgetType::UrlInput,
            WidgetType::Textarea,
            WidgetType::CheckboxInput,
            WidgetType::Select,
            WidgetType::SelectMultiple,
            WidgetType::DateInput,
            WidgetType::DateTimeInput,
            WidgetType::TimeInput,
            WidgetType::FileInput,
        ] {
            assert_eq!(create_widget(wt, Vec::new()).widget_type(), wt);
        }
        assert_eq!(WidgetType::DateTimeInput.to_string(), "DateTimeInput");
    }
}
