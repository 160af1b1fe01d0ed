//! Core error types for gaeforms.
//!
//! [`ValidationError`] carries a single validation failure (or a map of
//! per-field failures). [`GaeError`] is the library-level error enum used by
//! the datastore and form crates.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Represents a validation error with optional field-level errors.
///
/// Validators return this type; forms flatten it into per-field message
/// lists.
///
/// # Examples
///
/// ```
/// use gaeforms_core::error::ValidationError;
///
/// let err = ValidationError::new("Not a valid choice", "invalid_choice");
/// assert_eq!(err.to_string(), "Not a valid choice");
///
/// let mut field_errors = std::collections::HashMap::new();
/// field_errors.insert(
///     "geo".to_string(),
///     vec![ValidationError::new("Not a valid coordinate location", "invalid")],
/// );
/// let err = ValidationError::with_field_errors(field_errors);
/// assert!(err.to_string().starts_with("geo: "));
/// ```
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the failure (e.g. "required", "range").
    pub code: String,
    /// Additional parameters providing context for the message.
    pub params: HashMap<String, String>,
    /// Per-field validation errors, keyed by field name.
    pub field_errors: HashMap<String, Vec<Self>>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
            field_errors: HashMap::new(),
        }
    }

    /// Creates a `ValidationError` containing per-field errors.
    pub fn with_field_errors(field_errors: HashMap<String, Vec<Self>>) -> Self {
        Self {
            message: String::new(),
            code: String::new(),
            params: HashMap::new(),
            field_errors,
        }
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            write!(f, "{}", self.message)?;
        } else if !self.field_errors.is_empty() {
            let mut names: Vec<&String> = self.field_errors.keys().collect();
            names.sort();
            let mut first = true;
            for field in names {
                for error in &self.field_errors[field] {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{field}: {error}")?;
                    first = false;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for gaeforms.
#[derive(Error, Debug)]
pub enum GaeError {
    // ── Validation ───────────────────────────────────────────────────

    /// One or more values failed validation.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    // ── Datastore ────────────────────────────────────────────────────

    /// A key could not be decoded from its urlsafe form.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// A kind name was looked up but never registered.
    #[error("Kind not registered: {0}")]
    KindNotRegistered(String),

    /// A generic datastore failure (query or storage).
    #[error("Datastore error: {0}")]
    DatastoreError(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<ValidationError> for GaeError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError(err)
    }
}

/// A convenience type alias for `Result<T, GaeError>`.
pub type GaeResult<T> = Result<T, GaeError>;
