//! Property descriptors.
//!
//! A [`PropertyDef`] describes one declared property of a model: its name,
//! its [`PropertyType`], and the constraints form generation cares about.
//! Both the `ndb` and the legacy `db` model APIs are covered; their
//! property classes share names where they overlap (`StringProperty`,
//! `DateTimeProperty`, ...), so one enum holds both sets.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::value::Value;

static CREATION_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// The type of a datastore property.
///
/// [`type_name`](Self::type_name) returns the property class name that
/// converter tables are keyed by.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum PropertyType {
    // ── Shared by ndb and db ──────────────────────────────────────────
    /// Short indexed string.
    String,
    /// Boolean.
    Boolean,
    /// 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Date and time.
    DateTime,
    /// Date only.
    Date,
    /// Time only.
    Time,
    /// A Users API user.
    User,
    /// Unindexed long text.
    Text,
    /// Unindexed binary data.
    Blob,
    /// Geographical point.
    GeoPt,

    // ── ndb ───────────────────────────────────────────────────────────
    /// Nested model stored as sub-properties.
    Structured,
    /// Nested model stored as an opaque blob.
    LocalStructured,
    /// JSON document.
    Json,
    /// Pickled value.
    Pickle,
    /// Dynamically typed value.
    Generic,
    /// Blobstore key.
    BlobKey,
    /// Value computed from other properties.
    Computed,
    /// Key of another entity, optionally restricted to `kind`.
    Key {
        /// The referenced kind, if restricted.
        kind: Option<String>,
    },
    /// Polymodel class hierarchy key.
    ClassKey,

    // ── db ────────────────────────────────────────────────────────────
    /// Short indexed byte string.
    ByteString,
    /// List of a scalar item type.
    List {
        /// The item type.
        item: Box<PropertyType>,
    },
    /// List of strings.
    StringList,
    /// Reference to another entity, optionally restricted to `kind`.
    Reference {
        /// The referenced kind, if restricted.
        kind: Option<String>,
    },
    /// Reference to an entity of the declaring model's own kind.
    SelfReference,
    /// Category string.
    Category,
    /// URL.
    Link,
    /// Email address.
    Email,
    /// Instant messaging handle.
    Im,
    /// Phone number.
    PhoneNumber,
    /// Postal address.
    PostalAddress,
    /// Rating from 0 to 100.
    Rating,

    /// A user-defined property class, named by its class name.
    Custom {
        /// The property class name, e.g. `"SlugProperty"`.
        name: String,
    },
}

impl PropertyType {
    /// Returns the property class name.
    ///
    /// # Examples
    ///
    /// ```
    /// use gaeforms_datastore::PropertyType;
    ///
    /// assert_eq!(PropertyType::String.type_name(), "StringProperty");
    /// assert_eq!(PropertyType::ClassKey.type_name(), "_ClassKeyProperty");
    /// assert_eq!(
    ///     PropertyType::Custom { name: "SlugProperty".into() }.type_name(),
    ///     "SlugProperty"
    /// );
    /// ```
    pub fn type_name(&self) -> &str {
        match self {
            Self::String => "StringProperty",
            Self::Boolean => "BooleanProperty",
            Self::Integer => "IntegerProperty",
            Self::Float => "FloatProperty",
            Self::DateTime => "DateTimeProperty",
            Self::Date => "DateProperty",
            Self::Time => "TimeProperty",
            Self::User => "UserProperty",
            Self::Text => "TextProperty",
            Self::Blob => "BlobProperty",
            Self::GeoPt => "GeoPtProperty",
            Self::Structured => "StructuredProperty",
            Self::LocalStructured => "LocalStructuredProperty",
            Self::Json => "JsonProperty",
            Self::Pickle => "PickleProperty",
            Self::Generic => "GenericProperty",
            Self::BlobKey => "BlobKeyProperty",
            Self::Computed => "ComputedProperty",
            Self::Key { .. } => "KeyProperty",
            Self::ClassKey => "_ClassKeyProperty",
            Self::ByteString => "ByteStringProperty",
            Self::List { .. } => "ListProperty",
            Self::StringList => "StringListProperty",
            Self::Reference { .. } => "ReferenceProperty",
            Self::SelfReference => "SelfReferenceProperty",
            Self::Category => "CategoryProperty",
            Self::Link => "LinkProperty",
            Self::Email => "EmailProperty",
            Self::Im => "IMProperty",
            Self::PhoneNumber => "PhoneNumberProperty",
            Self::PostalAddress => "PostalAddressProperty",
            Self::Rating => "RatingProperty",
            Self::Custom { name } => name,
        }
    }

    /// Returns the referenced kind of a `Key` or `Reference` property.
    pub fn reference_kind(&self) -> Option<&str> {
        match self {
            Self::Key { kind } | Self::Reference { kind } => kind.as_deref(),
            _ => None,
        }
    }

    /// A `KeyProperty` restricted to `kind`.
    pub fn key(kind: impl Into<String>) -> Self {
        Self::Key {
            kind: Some(kind.into()),
        }
    }

    /// A `ReferenceProperty` to `kind`.
    pub fn reference(kind: impl Into<String>) -> Self {
        Self::Reference {
            kind: Some(kind.into()),
        }
    }

    /// A `ListProperty` of `item`.
    pub fn list(item: Self) -> Self {
        Self::List {
            item: Box::new(item),
        }
    }
}

/// A declared model property.
///
/// Every `PropertyDef` takes the next value of a process-wide creation
/// counter when constructed, so sorting by
/// [`creation_counter`](Self::creation_counter) recovers declaration order.
///
/// # Examples
///
/// ```
/// use gaeforms_datastore::{PropertyDef, PropertyType};
///
/// let a = PropertyDef::new("title", PropertyType::String).required();
/// let b = PropertyDef::new("tags", PropertyType::String).repeated();
/// assert!(a.creation_counter < b.creation_counter);
/// assert!(a.required && !a.repeated);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    /// The attribute name.
    pub name: String,
    /// The property type.
    pub property_type: PropertyType,
    /// Human-readable name, used as the form label when set.
    pub verbose_name: Option<String>,
    /// Default value for new entities.
    pub default: Option<Value>,
    /// Whether a value must be supplied.
    pub required: bool,
    /// Whether the property holds a list of values (ndb).
    pub repeated: bool,
    /// The allowed values, if enumerated.
    pub choices: Option<Vec<Value>>,
    /// Set to the current time on every write.
    pub auto_now: bool,
    /// Set to the current time on creation.
    pub auto_now_add: bool,
    /// Whether a db `StringProperty` accepts newlines.
    pub multiline: bool,
    /// Declaration order.
    pub creation_counter: usize,
}

impl PropertyDef {
    /// Creates an optional, single-valued property with no default.
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            verbose_name: None,
            default: None,
            required: false,
            repeated: false,
            choices: None,
            auto_now: false,
            auto_now_add: false,
            multiline: false,
            creation_counter: CREATION_COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Sets the verbose name.
    #[must_use]
    pub fn verbose_name(mut self, name: impl Into<String>) -> Self {
        self.verbose_name = Some(name.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Marks the property as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the property as repeated.
    #[must_use]
    pub const fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Restricts the property to the given values.
    #[must_use]
    pub fn choices<T: Into<Value>>(mut self, choices: impl IntoIterator<Item = T>) -> Self {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Marks a date/time property as updated on every write.
    #[must_use]
    pub const fn auto_now(mut self) -> Self {
        self.auto_now = true;
        self
    }

    /// Marks a date/time property as set on creation.
    #[must_use]
    pub const fn auto_now_add(mut self) -> Self {
        self.auto_now_add = true;
        self
    }

    /// Allows newlines in a db `StringProperty`.
    #[must_use]
    pub const fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    /// Returns the property class name.
    pub fn type_name(&self) -> &str {
        self.property_type.type_name()
    }

    /// Returns `true` if the value is maintained by the datastore.
    pub const fn is_auto(&self) -> bool {
        self.auto_now || self.auto_now_add
    }
}
