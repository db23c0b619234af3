//! # boxoffice Document Model
//!
//! Schemaless documents and the coercion layer between a loosely-typed
//! remote document store and typed application code.
//!
//! This crate provides:
//! - The [`Fields`] map type and typed field accessors
//! - [`RecordSchema`] sanitization with documented default fallbacks
//! - Pre-flight [`Validator`]s for outgoing updates
//!
//! ## Key Invariants
//!
//! - Sanitization is total: every input, including a missing document,
//!   produces a complete record
//! - Sanitization is idempotent over the required-field subset
//! - Fields outside the schema pass through unchanged

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod fields;
mod schema;
mod validate;

pub use fields::{
    get_bool, get_f64, get_i64, get_str, last_updated, now_millis, stamp_last_updated, Fields,
    LAST_UPDATED,
};
pub use schema::{FieldDefault, FieldKind, FieldSpec, RecordSchema};
pub use validate::{ProfileValidator, ValidationErrors, Validator};
