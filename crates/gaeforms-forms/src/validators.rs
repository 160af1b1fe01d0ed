//! Field validators.
//!
//! Validators run on a field's cleaned [`Value`] after type coercion
//! succeeded. Each checks one constraint and ignores values of types it does
//! not apply to, so a length validator on an integer field is a no-op.

use std::fmt;
use std::sync::OnceLock;

use gaeforms_core::ValidationError;
use gaeforms_datastore::Value;
use regex::Regex;

/// A constraint on a cleaned field value.
///
/// # Examples
///
/// ```
/// use gaeforms_forms::validators::{LengthValidator, Validator};
/// use gaeforms_datastore::Value;
///
/// let v = LengthValidator::max(5);
/// assert!(v.validate(&Value::from("hi")).is_ok());
/// assert!(v.validate(&Value::from("too long")).is_err());
/// ```
pub trait Validator: Send + Sync + fmt::Debug {
    /// Validates the given value.
    fn validate(&self, value: &Value) -> Result<(), ValidationError>;

    /// Returns a human-readable name for this validator.
    fn name(&self) -> &str;
}

/// Limits the length of a string value, counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthValidator {
    /// Minimum length, inclusive.
    pub min: Option<usize>,
    /// Maximum length, inclusive.
    pub max: Option<usize>,
}

impl LengthValidator {
    /// Creates a validator with optional bounds.
    pub const fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }

    /// Only an upper bound.
    pub const fn max(max: usize) -> Self {
        Self::new(None, Some(max))
    }

    /// Only a lower bound.
    pub const fn min(min: usize) -> Self {
        Self::new(Some(min), None)
    }

    fn message(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => {
                format!("Field must be exactly {max} characters long.")
            }
            (Some(min), Some(max)) => {
                format!("Field must be between {min} and {max} characters long.")
            }
            (Some(min), None) => format!("Field must be at least {min} characters long."),
            (None, Some(max)) => format!("Field cannot be longer than {max} characters."),
            (None, None) => String::new(),
        }
    }
}

impl Validator for LengthValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let Value::String(s) = value else {
            return Ok(());
        };
        let len = s.chars().count();
        let too_short = self.min.is_some_and(|min| len < min);
        let too_long = self.max.is_some_and(|max| len > max);
        if too_short || too_long {
            return Err(ValidationError::new(self.message(), "length")
                .with_param("length", len.to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "LengthValidator"
    }
}

/// Limits a numeric value to an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberRangeValidator {
    /// Minimum value, inclusive.
    pub min: Option<i64>,
    /// Maximum value, inclusive.
    pub max: Option<i64>,
}

impl NumberRangeValidator {
    /// Creates a validator with optional bounds.
    pub const fn new(min: Option<i64>, max: Option<i64>) -> Self {
        Self { min, max }
    }

    /// Both bounds.
    pub const fn between(min: i64, max: i64) -> Self {
        Self::new(Some(min), Some(max))
    }

    /// The full range of a 64-bit signed integer.
    pub const fn int64() -> Self {
        Self::between(i64::MIN, i64::MAX)
    }

    fn message(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("Number must be between {min} and {max}."),
            (Some(min), None) => format!("Number must be at least {min}."),
            (None, Some(max)) => format!("Number must be at most {max}."),
            (None, None) => String::new(),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn in_range(&self, value: &Value) -> bool {
        match value {
            Value::Int(n) => {
                self.min.map_or(true, |min| *n >= min) && self.max.map_or(true, |max| *n <= max)
            }
            Value::Float(f) => {
                self.min.map_or(true, |min| *f >= min as f64)
                    && self.max.map_or(true, |max| *f <= max as f64)
            }
            _ => true,
        }
    }
}

impl Validator for NumberRangeValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if self.in_range(value) {
            Ok(())
        } else {
            Err(ValidationError::new(self.message(), "range"))
        }
    }

    fn name(&self) -> &str {
        "NumberRangeValidator"
    }
}

/// Checks that a string looks like an email address.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailValidator;

impl Validator for EmailValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("valid regex")
        });
        match value {
            Value::String(s) if !re.is_match(s) => {
                Err(ValidationError::new("Invalid email address.", "invalid_email"))
            }
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "EmailValidator"
    }
}

/// Checks that a string is an absolute `http`, `https` or `ftp` URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlValidator;

impl Validator for UrlValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r"^(?i)(https?|ftp)://[^\s/$.?#][^\s]*$").expect("valid regex")
        });
        match value {
            Value::String(s) if !re.is_match(s) => {
                Err(ValidationError::new("Invalid URL.", "invalid_url"))
            }
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "UrlValidator"
    }
}
