//! Generated form classes.
//!
//! A [`FormClass`] is a named, ordered list of field definitions. Model form
//! generation produces one; [`FormClass::instantiate`] turns it into a
//! [`BaseForm`] ready to be bound or seeded with an object. Classes compose:
//! a class can extend a base class, inheriting its fields first.

use crate::fields::FormFieldDef;
use crate::form::BaseForm;

/// A form class: a name plus ordered field definitions.
///
/// # Examples
///
/// ```
/// use gaeforms_forms::fields::{FormFieldDef, FormFieldType};
/// use gaeforms_forms::form_class::FormClass;
///
/// let base = FormClass::new("Base").with_field(FormFieldDef::new("csrf", FormFieldType::Json));
/// let form = FormClass::new("AuthorForm")
///     .with_field(FormFieldDef::new("active", FormFieldType::Boolean))
///     .extend(&base);
///
/// assert_eq!(form.field_names(), ["csrf", "active"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormClass {
    /// The class name.
    pub name: String,
    /// Field definitions in display order.
    pub fields: Vec<FormFieldDef>,
}

impl FormClass {
    /// Creates a class with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field. A field with the same name is replaced in place.
    #[must_use]
    pub fn with_field(mut self, field: FormFieldDef) -> Self {
        if let Some(existing) = self.fields.iter_mut().find(|f| f.name == field.name) {
            *existing = field;
        } else {
            self.fields.push(field);
        }
        self
    }

    /// Puts `base`'s fields first. Fields of this class override same-named
    /// base fields, keeping the base position.
    #[must_use]
    pub fn extend(self, base: &Self) -> Self {
        let mut merged = Self {
            name: self.name,
            fields: base.fields.clone(),
        };
        for field in self.fields {
            merged = merged.with_field(field);
        }
        merged
    }

    /// Returns `true` if the class has a field called `name`.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FormFieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the field names in order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Creates an unbound form instance.
    pub fn instantiate(&self) -> BaseForm {
        tracing::trace!(form = %self.name, "instantiating form");
        BaseForm::new(self.fields.clone())
    }
}
