//! Key and reference selection.
//!
//! A key field renders as a `<select>` whose options are the entities
//! returned by a [`Query`]. Option values are the entities' urlsafe keys;
//! option labels come from a [`LabelSource`]. [`KeyChoices`] holds the
//! query and the blank-option settings shared by the single and repeated
//! variants of the field.

use std::fmt;
use std::sync::Arc;

use gaeforms_datastore::{Entity, Key, Query, Value};
use once_cell::sync::OnceCell;

use crate::widgets::SelectOption;

const NOT_A_VALID_CHOICE: &str = "Not a valid choice";

/// Where the text of each option comes from.
#[derive(Clone, Default)]
pub enum LabelSource {
    /// The entity's `Display` text.
    #[default]
    Display,
    /// The value of a named property.
    Property(String),
    /// A function of the entity.
    Func(Arc<dyn Fn(&Entity) -> String + Send + Sync>),
}

impl LabelSource {
    /// Wraps a closure.
    pub fn func(f: impl Fn(&Entity) -> String + Send + Sync + 'static) -> Self {
        Self::Func(Arc::new(f))
    }

    /// Returns the label for `entity`. A missing property yields an empty
    /// label.
    pub fn label(&self, entity: &Entity) -> String {
        match self {
            Self::Display => entity.to_string(),
            Self::Property(name) => entity.get(name).map(ToString::to_string).unwrap_or_default(),
            Self::Func(f) => f(entity),
        }
    }
}

impl fmt::Debug for LabelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Display => write!(f, "Display"),
            Self::Property(name) => f.debug_tuple("Property").field(name).finish(),
            Self::Func(_) => write!(f, "Func(..)"),
        }
    }
}

/// The choice set of a key field.
///
/// The query runs at most once per instance; cloning yields a fresh
/// instance that will query again. A [prefetched](KeyChoices::prefetch)
/// choice set runs its query once and shares the result with every clone.
///
/// # Examples
///
/// ```
/// use gaeforms_datastore::{Datastore, Entity, Key, MemoryDatastore, Value};
/// use gaeforms_forms::key_field::{KeyChoices, LabelSource};
///
/// let store = MemoryDatastore::new();
/// store.put(Entity::new(Key::new("Author", 1)).with("name", "Jane")).unwrap();
///
/// let choices = KeyChoices::new(Some("Author".into()))
///     .query(store.query("Author"))
///     .get_label(LabelSource::Property("name".into()))
///     .allow_blank(true);
///
/// let options = choices.iter_choices(&Value::Null);
/// assert_eq!(options.len(), 2);
/// assert_eq!(options[0].value, "__None");
/// assert!(options[0].selected);
/// assert_eq!(options[1].label, "Jane");
/// ```
pub struct KeyChoices {
    /// The kind the options belong to.
    pub reference_kind: Option<String>,
    /// The query that lists the options. With no query there are no valid
    /// choices.
    pub query: Option<Arc<dyn Query>>,
    /// Option label source.
    pub get_label: LabelSource,
    /// Whether a blank option is offered.
    pub allow_blank: bool,
    /// Text of the blank option.
    pub blank_text: String,
    /// Submitted value of the blank option.
    pub blank_value: String,
    cache: OnceCell<Vec<Entity>>,
    prefetched: Option<Arc<Vec<Entity>>>,
}

impl KeyChoices {
    /// Creates a choice set with no query and no blank option.
    pub fn new(reference_kind: Option<String>) -> Self {
        Self {
            reference_kind,
            query: None,
            get_label: LabelSource::Display,
            allow_blank: false,
            blank_text: String::new(),
            blank_value: "__None".to_string(),
            cache: OnceCell::new(),
            prefetched: None,
        }
    }

    /// Sets the query.
    #[must_use]
    pub fn query(mut self, query: Arc<dyn Query>) -> Self {
        self.query = Some(query);
        self.cache = OnceCell::new();
        self.prefetched = None;
        self
    }

    /// Sets the label source.
    #[must_use]
    pub fn get_label(mut self, get_label: LabelSource) -> Self {
        self.get_label = get_label;
        self
    }

    /// Sets whether a blank option is offered.
    #[must_use]
    pub const fn allow_blank(mut self, allow_blank: bool) -> Self {
        self.allow_blank = allow_blank;
        self
    }

    /// Sets the blank option's text.
    #[must_use]
    pub fn blank_text(mut self, text: impl Into<String>) -> Self {
        self.blank_text = text.into();
        self
    }

    /// Sets the blank option's submitted value.
    #[must_use]
    pub fn blank_value(mut self, value: impl Into<String>) -> Self {
        self.blank_value = value.into();
        self
    }

    /// Runs the query now and keeps the result for this instance and all
    /// of its clones.
    #[must_use]
    pub fn prefetch(mut self) -> Self {
        self.entities();
        let entities = self.cache.take().unwrap_or_default();
        self.prefetched = Some(Arc::new(entities));
        self
    }

    /// Returns `true` if the options were fetched by [`prefetch`](Self::prefetch).
    pub const fn is_prefetched(&self) -> bool {
        self.prefetched.is_some()
    }

    /// Returns the entities the query yields. A failing query is logged and
    /// treated as empty.
    pub fn entities(&self) -> &[Entity] {
        if let Some(entities) = &self.prefetched {
            return entities;
        }
        self.cache.get_or_init(|| {
            let Some(query) = &self.query else {
                return Vec::new();
            };
            match query.fetch() {
                Ok(entities) => entities,
                Err(e) => {
                    tracing::warn!(
                        kind = self.reference_kind.as_deref().unwrap_or(""),
                        error = %e,
                        "key field query failed"
                    );
                    Vec::new()
                }
            }
        })
    }

    /// Returns `true` if `key` is one of the choices.
    pub fn contains(&self, key: &Key) -> bool {
        self.entities().iter().any(|e| &e.key == key)
    }

    /// Finds the choice whose urlsafe key is `raw`.
    pub fn find(&self, raw: &str) -> Option<&Entity> {
        let key = Key::from_urlsafe(raw).ok()?;
        self.entities().iter().find(|e| e.key == key)
    }

    /// Returns the options for a single select showing `current`, led by
    /// the blank option when blanks are allowed.
    pub fn iter_choices(&self, current: &Value) -> Vec<SelectOption> {
        let mut options = Vec::new();
        if self.allow_blank {
            options.push(SelectOption::new(
                self.blank_value.clone(),
                self.blank_text.clone(),
                current.is_null(),
            ));
        }
        options.extend(self.entity_options(|key| current.as_key() == Some(key)));
        options
    }

    /// Returns the options for a multiple select showing `current`, a list
    /// of keys. There is no blank option.
    pub fn iter_repeated_choices(&self, current: &Value) -> Vec<SelectOption> {
        let selected: Vec<&Key> = match current {
            Value::List(items) => items.iter().filter_map(Value::as_key).collect(),
            other => other.as_key().into_iter().collect(),
        };
        self.entity_options(|key| selected.contains(&key))
    }

    /// Returns the options with the submitted values `raw` selected.
    pub fn options_for(&self, raw: &[String], blank: bool) -> Vec<SelectOption> {
        let mut options = Vec::new();
        if blank && self.allow_blank {
            let is_blank = raw.first().map_or(true, |v| v.is_empty() || *v == self.blank_value);
            options.push(SelectOption::new(
                self.blank_value.clone(),
                self.blank_text.clone(),
                is_blank,
            ));
        }
        options.extend(self.entities().iter().map(|e| {
            let value = e.key.urlsafe();
            let selected = raw.contains(&value);
            SelectOption::new(value, self.get_label.label(e), selected)
        }));
        options
    }

    fn entity_options(&self, is_selected: impl Fn(&Key) -> bool) -> Vec<SelectOption> {
        self.entities()
            .iter()
            .map(|e| {
                SelectOption::new(e.key.urlsafe(), self.get_label.label(e), is_selected(&e.key))
            })
            .collect()
    }

    /// Cleans one submitted value. The blank value (or nothing) becomes
    /// `Null` when blanks are allowed.
    pub fn clean_single(&self, raw: Option<&str>) -> Result<Value, String> {
        let raw = raw.map(str::trim).unwrap_or("");
        if raw.is_empty() || raw == self.blank_value {
            return if self.allow_blank {
                Ok(Value::Null)
            } else {
                Err(NOT_A_VALID_CHOICE.to_string())
            };
        }
        self.find(raw)
            .map(|e| Value::Key(e.key.clone()))
            .ok_or_else(|| NOT_A_VALID_CHOICE.to_string())
    }

    /// Cleans the submitted values of a multiple select into a list of keys.
    /// Empty submissions are ignored.
    pub fn clean_repeated(&self, raw: &[String]) -> Result<Value, Vec<String>> {
        let mut keys = Vec::new();
        let mut errors = Vec::new();
        for value in raw.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
            match self.find(value) {
                Some(e) => keys.push(Value::Key(e.key.clone())),
                None => errors.push(format!("{value} is not a valid choice for this field")),
            }
        }
        if errors.is_empty() {
            Ok(Value::List(keys))
        } else {
            Err(errors)
        }
    }

    /// Checks a value that did not come from a submission, such as an
    /// object's stored key or initial data, against the choices.
    pub fn validate_selected(&self, value: &Value) -> Result<(), Vec<String>> {
        match value {
            Value::Null if self.allow_blank => Ok(()),
            Value::Key(key) if self.contains(key) => Ok(()),
            Value::List(items) => {
                let errors: Vec<String> = items
                    .iter()
                    .filter(|item| !item.as_key().is_some_and(|k| self.contains(k)))
                    .map(|item| format!("{item} is not a valid choice for this field"))
                    .collect();
                if errors.is_empty() {
                    Ok(())
                } else {
                    Err(errors)
                }
            }
            _ => Err(vec![NOT_A_VALID_CHOICE.to_string()]),
        }
    }
}

impl Clone for KeyChoices {
    fn clone(&self) -> Self {
        Self {
            reference_kind: self.reference_kind.clone(),
            query: self.query.clone(),
            get_label: self.get_label.clone(),
            allow_blank: self.allow_blank,
            blank_text: self.blank_text.clone(),
            blank_value: self.blank_value.clone(),
            cache: OnceCell::new(),
            prefetched: self.prefetched.clone(),
        }
    }
}

impl fmt::Debug for KeyChoices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyChoices")
            .field("reference_kind", &self.reference_kind)
            .field("query", &self.query)
            .field("get_label", &self.get_label)
            .field("allow_blank", &self.allow_blank)
            .field("blank_text", &self.blank_text)
            .field("blank_value", &self.blank_value)
            .field("prefetched", &self.is_prefetched())
            .finish_non_exhaustive()
    }
}
