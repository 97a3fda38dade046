//! # taxi-forms
//!
//! The form layer of taxi-rs. A form binds raw submitted data, runs the
//! validation pipeline, and exposes per-field errors and cleaned values.
//!
//! ## Pipeline
//!
//! 1. Type-level cleaning of every field ([`fields::clean_field_value`])
//! 2. Registered [`FieldCleaner`](form::FieldCleaner)s, in order
//! 3. Registered [`FormCleaner`](form::FormCleaner)s for cross-field checks
//!
//! Errors accumulate; nothing short-circuits across fields.
//!
//! ## Module Overview
//!
//! - [`querydict`] - Multi-valued submitted data
//! - [`validators`] - Reusable value validators
//! - [`widgets`] - Widget kinds attached to fields
//! - [`fields`] - Form field definitions and type-level cleaning
//! - [`form`] - The [`Form`](form::Form) trait and [`BaseForm`](form::BaseForm)
//! - [`validation`] - The pipeline steps
//! - [`model_form`] - Forms generated from model metadata

// - result_large_err: TaxiError is the crate-wide error type
#![allow(clippy::result_large_err)]

pub mod fields;
pub mod form;
pub mod model_form;
pub mod querydict;
pub mod validation;
pub mod validators;
pub mod widgets;

pub use fields::{FormFieldDef, FormFieldType};
pub use form::{BaseForm, FieldCleaner, Form, FormCleaner, NON_FIELD_ERRORS};
pub use model_form::{ModelForm, ModelFormConfig, ModelFormFields};
pub use querydict::QueryDict;
pub use widgets::WidgetType;
