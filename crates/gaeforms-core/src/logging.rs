//! Logging integration for gaeforms.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and a span used around form
//! generation.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The log level is read from `settings.log_level` (e.g. "debug", "info").
/// In debug mode a pretty, human-readable format is used; otherwise a
/// structured JSON format is used. Installing twice is a no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span covering the generation of a form for one kind.
///
/// # Examples
///
/// ```
/// use gaeforms_core::logging::model_form_span;
///
/// let span = model_form_span("Author");
/// let _guard = span.enter();
/// tracing::debug!("converting properties");
/// ```
pub fn model_form_span(kind: &str) -> tracing::Span {
    tracing::debug_span!("model_form", kind = kind)
}
