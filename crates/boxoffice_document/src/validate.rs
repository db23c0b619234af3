//! Pre-flight validation of outgoing updates.
//!
//! Validation runs before any network call, so a rejected update performs
//! no partial writes. Failures carry a field-to-message map the UI can
//! render inline.

use crate::fields::Fields;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Field name to human-readable message, one entry per rejected field.
pub type ValidationErrors = BTreeMap<String, String>;

/// Validates an outgoing update before it reaches the store.
pub trait Validator: Send + Sync {
    /// Checks `fields`, returning per-field messages on rejection.
    fn validate(&self, fields: &Fields) -> Result<(), ValidationErrors>;
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern"));

const DISPLAY_NAME_MAX: usize = 80;

/// Built-in validator for profile-shaped updates.
///
/// Only fields present in the update are checked; a partial update that
/// omits a field is not rejected for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileValidator;

impl Validator for ProfileValidator {
    fn validate(&self, fields: &Fields) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(value) = fields.get("email") {
            match value.as_str() {
                Some(email) if EMAIL_RE.is_match(email) => {}
                _ => {
                    errors.insert("email".into(), "must be a valid email address".into());
                }
            }
        }

        if let Some(value) = fields.get("displayName") {
            match value.as_str() {
                Some(name) if !name.trim().is_empty() && name.chars().count() <= DISPLAY_NAME_MAX => {
                }
                _ => {
                    errors.insert(
                        "displayName".into(),
                        format!("must be non-empty and at most {DISPLAY_NAME_MAX} characters"),
                    );
                }
            }
        }

        if let Some(value) = fields.get("age") {
            match value.as_i64() {
                Some(age) if (13..=120).contains(&age) => {}
                _ => {
                    errors.insert("age".into(), "must be an integer between 13 and 120".into());
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
