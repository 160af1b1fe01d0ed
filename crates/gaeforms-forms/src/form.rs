//! Form trait and `BaseForm` implementation.
//!
//! The [`Form`] trait is the core abstraction for all form types. It
//! supports async validation, so a [`Form::clean`] override can run a
//! datastore lookup, and binding from submitted [`FormData`].
//!
//! [`BaseForm`] is the concrete implementation that generated form classes
//! instantiate. Besides submitted data it can be seeded from a stored
//! [`Entity`] and from initial values, and it can write its cleaned data back
//! into an entity.

use std::collections::HashMap;

use async_trait::async_trait;
use gaeforms_datastore::{Entity, Value};

use crate::bound_field::BoundField;
use crate::fields::FormFieldDef;
use crate::form_data::FormData;
use crate::validation;
use crate::widgets;

/// The core form trait.
///
/// All implementations must be `Send + Sync` so forms can be validated
/// across async task boundaries.
#[async_trait]
pub trait Form: Send + Sync {
    /// Returns the form's field definitions.
    fn fields(&self) -> &[FormFieldDef];

    /// Returns the initial values for fields.
    fn initial(&self) -> &HashMap<String, Value>;

    /// Returns the form prefix (for namespacing multiple forms on one page).
    fn prefix(&self) -> Option<&str>;

    /// Binds submitted data to this form.
    fn bind(&mut self, data: &FormData);

    /// Returns `true` if this form has been bound to data.
    fn is_bound(&self) -> bool;

    /// Validates the form. Returns `true` if valid.
    ///
    /// After calling this, `errors()` and `cleaned_data()` are populated.
    async fn is_valid(&mut self) -> bool;

    /// Returns per-field validation errors. Form-level errors are stored
    /// under `"__all__"`.
    fn errors(&self) -> &HashMap<String, Vec<String>>;

    /// Returns the cleaned (validated and coerced) data.
    fn cleaned_data(&self) -> &HashMap<String, Value>;

    /// Cross-field validation hook. The default implementation does nothing.
    async fn clean(&self) -> Result<(), HashMap<String, Vec<String>>> {
        Ok(())
    }
}

/// A general-purpose form implementation.
///
/// # Examples
///
/// ```
/// use gaeforms_forms::fields::{FormFieldDef, FormFieldType};
/// use gaeforms_forms::form::{BaseForm, Form};
/// use gaeforms_forms::form_data::FormData;
/// use gaeforms_datastore::Value;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut form = BaseForm::new(vec![FormFieldDef::new(
///     "title",
///     FormFieldType::Char { min_length: None, max_length: Some(10), strip: true },
/// )
/// .required(true)]);
///
/// form.bind(&FormData::parse("title=Dune"));
/// assert!(form.is_valid().await);
/// assert_eq!(form.data("title"), Value::from("Dune"));
/// # }
/// ```
pub struct BaseForm {
    field_defs: Vec<FormFieldDef>,
    initial_data: HashMap<String, Value>,
    object: Option<Entity>,
    prefix: Option<String>,
    bound: bool,
    raw_data: HashMap<String, Vec<String>>,
    errors: HashMap<String, Vec<String>>,
    cleaned_data: HashMap<String, Value>,
}

impl BaseForm {
    /// Creates a new `BaseForm` with the given field definitions.
    pub fn new(fields: Vec<FormFieldDef>) -> Self {
        Self {
            field_defs: fields,
            initial_data: HashMap::new(),
            object: None,
            prefix: None,
            bound: false,
            raw_data: HashMap::new(),
            errors: HashMap::new(),
            cleaned_data: HashMap::new(),
        }
    }

    /// Sets initial values for fields. They take precedence over field
    /// defaults but not over the object's values.
    #[must_use]
    pub fn with_initial(mut self, initial: HashMap<String, Value>) -> Self {
        self.initial_data = initial;
        self
    }

    /// Sets the form prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Seeds the form with a stored entity's values.
    #[must_use]
    pub fn with_object(mut self, object: &Entity) -> Self {
        self.object = Some(object.clone());
        self
    }

    /// Returns the entity the form was seeded with.
    pub const fn object(&self) -> Option<&Entity> {
        self.object.as_ref()
    }

    /// Returns the current value of a field: cleaned data, then the
    /// object's value, then initial data, then the field default.
    pub fn data(&self, name: &str) -> Value {
        if let Some(v) = self.cleaned_data.get(name) {
            return v.clone();
        }
        if let Some(v) = self.object.as_ref().and_then(|o| o.get(name)) {
            return v.clone();
        }
        if let Some(v) = self.initial_data.get(name) {
            return v.clone();
        }
        self.field_defs
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.default.clone())
            .unwrap_or(Value::Null)
    }

    /// Returns bound fields for rendering, in field order.
    pub fn bound_fields(&self) -> Vec<BoundField> {
        self.field_defs
            .iter()
            .map(|field| self.bind_field(field))
            .collect()
    }

    /// Returns the bound field called `name`.
    pub fn field(&self, name: &str) -> Option<BoundField> {
        self.field_defs
            .iter()
            .find(|f| f.name == name)
            .map(|field| self.bind_field(field))
    }

    /// Returns the non-field (form-level) errors.
    pub fn non_field_errors(&self) -> &[String] {
        self.errors.get("__all__").map_or(&[][..], Vec::as_slice)
    }

    /// Writes every field's current value into `entity`. A list-valued
    /// field with no value writes an empty list.
    pub fn populate_entity(&self, entity: &mut Entity) {
        for field in &self.field_defs {
            let value = match self.data(&field.name) {
                Value::Null if field.is_list_valued() => Value::List(Vec::new()),
                value => value,
            };
            entity.set(field.name.clone(), value);
        }
    }

    fn html_name(&self, name: &str) -> String {
        match &self.prefix {
            Some(p) => format!("{p}-{name}"),
            None => name.to_string(),
        }
    }

    fn bind_field(&self, field: &FormFieldDef) -> BoundField {
        let errors = self.errors.get(&field.name).cloned().unwrap_or_default();
        if self.bound {
            let raw = self.raw_data.get(&field.name).map_or(&[][..], Vec::as_slice);
            BoundField::from_raw(field, raw, errors, self.prefix.as_deref())
        } else {
            let value = self.data(&field.name);
            BoundField::from_value(field, &value, errors, self.prefix.as_deref())
        }
    }
}

#[async_trait]
impl Form for BaseForm {
    fn fields(&self) -> &[FormFieldDef] {
        &self.field_defs
    }

    fn initial(&self) -> &HashMap<String, Value> {
        &self.initial_data
    }

    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    fn bind(&mut self, data: &FormData) {
        self.bound = true;
        self.raw_data.clear();
        self.errors.clear();
        self.cleaned_data.clear();

        for field in &self.field_defs {
            let html_name = self.html_name(&field.name);
            let widget = widgets::create_widget(field.widget, Vec::new());
            let values = widget.value_from_data(data, &html_name);
            self.raw_data.insert(field.name.clone(), values);
        }
    }

    fn is_bound(&self) -> bool {
        self.bound
    }

    async fn is_valid(&mut self) -> bool {
        self.errors.clear();
        self.cleaned_data.clear();

        if self.bound {
            validation::clean_fields(
                &self.field_defs,
                &self.raw_data,
                &mut self.cleaned_data,
                &mut self.errors,
            );
        } else {
            let values: HashMap<String, Value> = self
                .field_defs
                .iter()
                .map(|f| (f.name.clone(), self.data(&f.name)))
                .collect();
            validation::validate_values(
                &self.field_defs,
                &values,
                &mut self.cleaned_data,
                &mut self.errors,
            );
        }

        if let Err(form_errors) = self.clean().await {
            for (key, msgs) in form_errors {
                self.errors.entry(key).or_default().extend(msgs);
            }
        }

        tracing::debug!(
            bound = self.bound,
            errors = self.errors.len(),
            "form validated"
        );
        self.errors.is_empty()
    }

    fn errors(&self) -> &HashMap<String, Vec<String>> {
        &self.errors
    }

    fn cleaned_data(&self) -> &HashMap<String, Value> {
        &self.cleaned_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FormFieldType;
    use crate::key_field::KeyChoices;
    use gaeforms_datastore::{Datastore, Key, MemoryDatastore};

    fn make_test_form() -> BaseForm {
        BaseForm::new(vec![
            FormFieldDef::new(
                "username",
                FormFieldType::Char {
                    min_length: Some(3),
                    max_length: Some(20),
                    strip: true,
                },
            )
            .required(true),
            FormFieldDef::new("email", FormFieldType::Email).required(true),
            FormFieldDef::new(
                "age",
                FormFieldType::Integer {
                    min_value: Some(0),
                    max_value: Some(150),
                },
            ),
            FormFieldDef::new("tags", FormFieldType::StringList),
        ])
    }

    struct NoBobForm {
        inner: BaseForm,
    }

    #[async_trait]
    impl Form for NoBobForm {
        fn fields(&self) -> &[FormFieldDef] {
            self.inner.fields()
        }

        fn initial(&self) -> &HashMap<String, Value> {
            self.inner.initial()
        }

        fn prefix(&self) -> Option<&str> {
            self.inner.prefix()
        }

        fn bind(&mut self, data: &FormData) {
            self.inner.bind(data);
        }

        fn is_bound(&self) -> bool {
            self.inner.is_bound()
        }

        async fn is_valid(&mut self) -> bool {
            self.inner.is_valid().await;
            if let Err(form_errors) = self.clean().await {
                for (key, msgs) in form_errors {
                    self.inner.errors.entry(key).or_default().extend(msgs);
                }
            }
            self.inner.errors.is_empty()
        }

        fn errors(&self) -> &HashMap<String, Vec<String>> {
            self.inner.errors()
        }

        fn cleaned_data(&self) -> &HashMap<String, Value> {
            self.inner.cleaned_data()
        }

        async fn clean(&self) -> Result<(), HashMap<String, Vec<String>>> {
            if self.inner.cleaned_data().get("username") == Some(&Value::from("bob")) {
                let mut errors = HashMap::new();
                errors.insert("__all__".to_string(), vec!["No Bobs.".to_string()]);
                return Err(errors);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_bind_and_validate() {
        let mut form = make_test_form();
        form.bind(&FormData::parse("username=alice&email=alice@example.com&age=30"));
        assert!(form.is_bound());
        assert!(form.is_valid().await);
        assert_eq!(form.cleaned_data().get("username"), Some(&Value::from("alice")));
        assert_eq!(form.cleaned_data().get("age"), Some(&Value::Int(30)));
        assert_eq!(form.cleaned_data().get("tags"), Some(&Value::List(vec![])));
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let mut form = make_test_form();
        form.bind(&FormData::parse("username=ab&email=not-email"));
        assert!(!form.is_valid().await);
        assert_eq!(
            form.errors()["username"],
            ["Field must be between 3 and 20 characters long."]
        );
        assert_eq!(form.errors()["email"], ["Invalid email address."]);
    }

    #[tokio::test]
    async fn test_unbound_validates_current_data() {
        let mut form = make_test_form();
        assert!(!form.is_bound());
        assert!(!form.is_valid().await);
        assert_eq!(form.errors()["username"], ["This field is required."]);

        let mut initial = HashMap::new();
        initial.insert("username".to_string(), Value::from("alice"));
        initial.insert("email".to_string(), Value::from("alice@example.com"));
        let mut form = make_test_form().with_initial(initial);
        assert!(form.is_valid().await);
    }

    #[tokio::test]
    async fn test_with_prefix() {
        let mut form = make_test_form().with_prefix("p");
        assert_eq!(form.prefix(), Some("p"));
        form.bind(&FormData::parse("p-username=alice&p-email=alice@example.com&username=x"));
        assert!(form.is_valid().await);
        assert_eq!(form.bound_fields()[0].name, "p-username");
    }

    #[tokio::test]
    async fn test_rebind_clears_state() {
        let mut form = make_test_form();
        form.bind(&FormData::parse("username=ab"));
        assert!(!form.is_valid().await);
        form.bind(&FormData::parse("username=alice&email=alice@example.com"));
        assert!(form.is_valid().await);
        assert!(form.errors().is_empty());
    }

    #[tokio::test]
    async fn test_clean_hook() {
        let mut form = NoBobForm {
            inner: make_test_form(),
        };
        form.bind(&FormData::parse("username=bob&email=bob@example.com"));
        assert!(!form.is_valid().await);
        assert_eq!(form.inner.non_field_errors(), ["No Bobs."]);
        assert_eq!(form.errors().len(), 1);

        let mut form = NoBobForm {
            inner: make_test_form(),
        };
        form.bind(&FormData::parse("username=alice&email=a@example.com"));
        assert!(form.is_valid().await);
    }

    #[test]
    fn test_data_precedence() {
        let form = BaseForm::new(vec![
            FormFieldDef::new("a", FormFieldType::Json).default(1),
            FormFieldDef::new("b", FormFieldType::Json).default(1),
            FormFieldDef::new("c", FormFieldType::Json).default(1),
            FormFieldDef::new("d", FormFieldType::Json),
        ]);
        let mut initial = HashMap::new();
        initial.insert("a".to_string(), Value::Int(2));
        initial.insert("b".to_string(), Value::Int(2));
        let object = Entity::new(Key::new("Thing", 1)).with("a", 3);
        let form = form.with_initial(initial).with_object(&object);
        assert_eq!(form.data("a"), Value::Int(3));
        assert_eq!(form.data("b"), Value::Int(2));
        assert_eq!(form.data("c"), Value::Int(1));
        assert_eq!(form.data("d"), Value::Null);
        assert_eq!(form.object().map(|o| o.kind()), Some("Thing"));
    }

    #[test]
    fn test_bound_fields_show_object_values() {
        let object = Entity::new(Key::new("User", 1))
            .with("username", "alice")
            .with("tags", Value::list(["a", "b"]));
        let form = make_test_form().with_object(&object);
        let fields = form.bound_fields();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].data.as_deref(), Some("alice"));
        assert_eq!(form.field("tags").and_then(|f| f.data), Some("a\nb".to_string()));
        assert!(form.field("missing").is_none());
    }

    #[tokio::test]
    async fn test_bound_fields_show_submitted_text() {
        let mut form = make_test_form();
        form.bind(&FormData::parse("username=alice&age=abc&tags=x%0Ay"));
        assert!(!form.is_valid().await);
        let age = form.field("age").unwrap();
        assert_eq!(age.data.as_deref(), Some("abc"));
        assert!(age.has_errors());
        assert_eq!(form.field("tags").and_then(|f| f.data), Some("x\ny".to_string()));
    }

    #[tokio::test]
    async fn test_populate_entity() {
        let mut form = make_test_form();
        form.bind(&FormData::parse("username=alice&email=alice@example.com&tags=a%0Ab"));
        assert!(form.is_valid().await);
        let mut entity = Entity::new(Key::new("User", 0));
        form.populate_entity(&mut entity);
        assert_eq!(entity.get("username"), Some(&Value::from("alice")));
        assert_eq!(entity.get("age"), Some(&Value::Null));
        assert_eq!(entity.get("tags"), Some(&Value::list(["a", "b"])));
    }

    #[test]
    fn test_populate_entity_empty_list() {
        let store = MemoryDatastore::new();
        let choices = KeyChoices::new(None).query(store.query("Author"));
        let form = BaseForm::new(vec![FormFieldDef::new(
            "authors",
            FormFieldType::RepeatedKey(choices),
        )]);
        let mut entity = Entity::new(Key::new("Book", 1));
        form.populate_entity(&mut entity);
        assert_eq!(entity.get("authors"), Some(&Value::List(vec![])));
    }

    #[tokio::test]
    async fn test_object_key_not_in_query() {
        let store = MemoryDatastore::new();
        store.put(Entity::new(Key::new("Author", 1))).unwrap();
        let choices = KeyChoices::new(None).query(store.query("Author"));
        let fields = vec![FormFieldDef::new("author", FormFieldType::Key(choices))];

        let book = Entity::new(Key::new("Book", 1)).with("author", Key::new("Author", 1));
        let mut form = BaseForm::new(fields.clone()).with_object(&book);
        assert!(form.is_valid().await);

        let stray = Entity::new(Key::new("Book", 2)).with("author", Key::new("Author", 9));
        let mut form = BaseForm::new(fields).with_object(&stray);
        assert!(!form.is_valid().await);
        assert_eq!(form.errors()["author"], ["Not a valid choice"]);
    }
}
