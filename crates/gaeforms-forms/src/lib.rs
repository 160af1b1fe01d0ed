//! # gaeforms-forms
//!
//! Form fields, widgets, and forms generated from datastore models.
//!
//! ## Modules
//!
//! - [`fields`] - Field definitions, cleaning, and display values
//! - [`key_field`] - Key selects backed by a query
//! - [`validators`] - Length, number range, email, and URL validators
//! - [`widgets`] - HTML widgets
//! - [`bound_field`] - Fields bound to data and errors
//! - [`form_data`] - Submitted form data
//! - [`form`] - The [`Form`](form::Form) trait and [`BaseForm`](form::BaseForm)
//! - [`form_class`] - Form classes generated at runtime
//! - [`validation`] - The validation pipeline
//! - [`converter`] - Property-to-field conversion tables
//! - [`ndb`] / [`db`] - The conversion tables of the two model APIs
//! - [`model_form`] - Model form generation

pub mod bound_field;
pub mod converter;
pub mod db;
pub mod fields;
pub mod form;
pub mod form_class;
pub mod form_data;
pub mod key_field;
pub mod model_form;
pub mod ndb;
pub mod validation;
pub mod validators;
pub mod widgets;

pub use converter::{ConversionContext, Converter, FieldArgs, ModelConverter};
pub use fields::{FormFieldDef, FormFieldType};
pub use form::{BaseForm, Form};
pub use form_class::FormClass;
pub use form_data::FormData;
pub use key_field::{KeyChoices, LabelSource};
pub use model_form::{model_fields, model_form, ModelFormConfig, ModelFormFields};
