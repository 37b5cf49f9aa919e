// Validation Module - form and field validation
use std::collections::BTreeMap;
use std::fmt;

mod forms;
mod validators;

pub use forms::{validate_login, validate_signup, LoginField, SignupField};
pub use validators::{
    EmailValidator, FieldValidator, PasswordPolicy, PasswordRequirement, StringValidator,
    SPECIAL_CHARACTERS,
};

/// Type alias for validation results
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Field name to message, one message per field
pub type FieldErrors = BTreeMap<String, String>;

/// Validation error with detailed field-level errors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Create with a single field error
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.add_field_error(field, message);
        err
    }

    /// Add a field-level error
    pub fn add_field_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get error count
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// First message recorded for `field`
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors.iter().find(|e| e.field == field).map(|e| e.message.as_str())
    }

    /// Field map keeping the first message per field
    pub fn to_field_errors(&self) -> FieldErrors {
        let mut map = FieldErrors::new();
        for error in &self.errors {
            map.entry(error.field.clone()).or_insert_with(|| error.message.clone());
        }
        map
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`
    pub fn into_result(self) -> ValidationResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Merge another validation error into this one
    pub fn merge(&mut self, other: ValidationError) {
        self.errors.extend(other.errors);
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => write!(f, "Validation error with no specific field errors"),
            [only] => write!(f, "{}", only.message),
            errors => {
                write!(f, "Validation failed with {} errors: ", errors.len())?;
                for (i, error) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}: {}", error.field, error.message)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Individual field error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    /// Create a new field error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_error_converts_to_ok() {
        assert_eq!(ValidationError::new().into_result(), Ok(()));
    }

    #[test]
    fn test_field_map_keeps_first_message() {
        let mut err = ValidationError::field("email", "Email is required");
        err.add_field_error("email", "Invalid email format");
        err.add_field_error("password", "Password is required");

        let map = err.to_field_errors();
        assert_eq!(map.len(), 2);
        assert_eq!(map["email"], "Email is required");
        assert_eq!(err.message_for("password"), Some("Password is required"));
        assert_eq!(err.error_count(), 3);
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(
            ValidationError::field("password", "Password is required").to_string(),
            "Password is required"
        );

        let mut err = ValidationError::field("email", "Email is required");
        err.merge(ValidationError::field("password", "Password is required"));
        assert_eq!(
            err.to_string(),
            "Validation failed with 2 errors: email: Email is required; password: Password is required"
        );
    }
}
