//! Settings for gaeforms.
//!
//! [`Settings`] holds the library configuration, with [`FormSettings`]
//! carrying the knobs used during model-to-form conversion (string length
//! limit, blank choice sentinel, date formats). [`SETTINGS`] is an optional,
//! lazily-configured global instance.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Defaults used when converting model properties to form fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSettings {
    /// Maximum length applied to string-like properties (bytes in the datastore).
    pub string_max_length: usize,
    /// The option value that stands for "no selection" in key selects.
    pub blank_value: String,
    /// Default label of the blank option in key selects.
    pub blank_text: String,
    /// Default format for date fields.
    pub date_format: String,
    /// Default format for date-time fields.
    pub datetime_format: String,
    /// Default format for time fields.
    pub time_format: String,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            string_max_length: 500,
            blank_value: "__None".to_string(),
            blank_text: String::new(),
            date_format: "%Y-%m-%d".to_string(),
            datetime_format: "%Y-%m-%d %H:%M:%S".to_string(),
            time_format: "%H:%M:%S".to_string(),
        }
    }
}

/// The complete set of library settings.
///
/// # Examples
///
/// ```
/// use gaeforms_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.forms.string_max_length, 500);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
    /// `tracing` filter directive, e.g. "info" or "gaeforms_forms=debug".
    pub log_level: String,
    /// Conversion defaults.
    pub forms: FormSettings,
    /// Escape hatch for application-specific values.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            forms: FormSettings::default(),
            extra: HashMap::new(),
        }
    }
}

/// A lazily-configured global settings slot.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates an unconfigured slot.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the settings. Returns the rejected settings if the slot
    /// was already configured.
    pub fn configure(&self, settings: Settings) -> Result<(), Settings> {
        self.inner.set(settings)
    }

    /// Returns the configured settings, if any.
    pub fn get(&self) -> Option<&Settings> {
        self.inner.get()
    }

    /// Returns the configured form settings, or the defaults.
    pub fn forms_or_default(&self) -> FormSettings {
        self.inner
            .get()
            .map_or_else(FormSettings::default, |s| s.forms.clone())
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
///
/// Configuring it is optional: converters fall back to
/// [`FormSettings::default`] when it is empty.
pub static SETTINGS: LazySettings = LazySettings::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert_eq!(s.log_level, "info");
        assert_eq!(s.forms.string_max_length, 500);
        assert_eq!(s.forms.blank_value, "__None");
        assert_eq!(s.forms.blank_text, "");
        assert_eq!(s.forms.date_format, "%Y-%m-%d");
        assert_eq!(s.forms.datetime_format, "%Y-%m-%d %H:%M:%S");
        assert_eq!(s.forms.time_format, "%H:%M:%S");
        assert!(s.extra.is_empty());
    }

    #[test]
    fn test_lazy_settings_configure_and_get() {
        let lazy = LazySettings::new();
        assert!(!lazy.is_configured());
        assert_eq!(lazy.forms_or_default(), FormSettings::default());

        let mut settings = Settings::default();
        settings.forms.string_max_length = 100;
        assert!(lazy.configure(settings).is_ok());
        assert!(lazy.is_configured());
        assert_eq!(lazy.forms_or_default().string_max_length, 100);
    }

    #[test]
    fn test_lazy_settings_double_configure_rejected() {
        let lazy = LazySettings::new();
        assert!(lazy.configure(Settings::default()).is_ok());
        assert!(lazy.configure(Settings::default()).is_err());
    }
}
