//! Field-level validation errors.
//!
//! Validators collect every problem with an input instead of stopping at the
//! first one, so a form can highlight all offending fields in one round trip.

use core::fmt;

use serde::Serialize;

/// A single invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every invalid field found in one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Shorthand for an error list with one entry.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Append another validator's errors as they are.
    pub fn merge(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Append another validator's errors, prefixing their field names.
    pub fn merge_prefixed(&mut self, prefix: &str, other: Self) {
        self.0.extend(other.0.into_iter().map(|e| FieldError {
            field: format!("{prefix}.{}", e.field),
            message: e.message,
        }));
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// `Ok(value)` if nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field error was added.
    pub fn finish<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

/// Trim a required text field, recording an error if it is blank or too long.
pub(crate) fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    max_chars: usize,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "This field is required.");
    } else if value.chars().count() > max_chars {
        errors.add(field, format!("Ensure this field has at most {max_chars} characters."));
    }
    value.to_owned()
}

/// Trim an optional text field; blank becomes `None`.
pub(crate) fn optional_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    max_chars: usize,
) -> Option<String> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    if value.chars().count() > max_chars {
        errors.add(field, format!("Ensure this field has at most {max_chars} characters."));
    }
    Some(value.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("city", "This field is required.");
        errors.add("email", "Enter a valid email address.");
        assert_eq!(
            errors.to_string(),
            "city: This field is required.; email: Enter a valid email address."
        );
    }

    #[test]
    fn test_merge_prefixed() {
        let mut errors = ValidationErrors::new();
        errors.merge_prefixed("shipping", ValidationErrors::single("city", "required"));
        assert_eq!(errors.errors()[0].field, "shipping.city");
    }

    #[test]
    fn test_required_and_optional_text() {
        let mut errors = ValidationErrors::new();
        assert_eq!(required_text(&mut errors, "city", "  Pallet ", 255), "Pallet");
        assert!(errors.is_empty());

        assert_eq!(optional_text(&mut errors, "state", Some("   "), 255), None);
        assert!(errors.is_empty());

        required_text(&mut errors, "city", " ", 255);
        optional_text(&mut errors, "zipcode", Some("123456"), 5);
        assert_eq!(errors.errors().len(), 2);
    }
}
