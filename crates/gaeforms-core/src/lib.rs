//! # gaeforms-core
//!
//! Core types shared by every gaeforms crate: the error enum, settings and
//! their loaders, `tracing` setup, and a couple of small utilities.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Form generation settings and the global settings slot
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`utils`] - `MultiValueDict` and text helpers

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{GaeError, GaeResult, ValidationError};
pub use settings::{FormSettings, Settings, SETTINGS};
