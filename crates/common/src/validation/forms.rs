//! Login and signup form rules
//!
//! Checks run before any request is sent. Every failing field gets exactly
//! one message; later checks on a field are skipped once one fails.

use jigsaw_domain::{AccountType, SignupRequest};

use super::validators::{EmailValidator, FieldValidator, PasswordPolicy, StringValidator};
use super::{ValidationError, ValidationResult};

const USERNAME_MIN_LENGTH: usize = 3;

/// Field names reported by [`validate_login`]
pub struct LoginField;

impl LoginField {
    pub const EMAIL: &'static str = "email";
    pub const PASSWORD: &'static str = "password";
}

/// Field names reported by [`validate_signup`]
pub struct SignupField;

impl SignupField {
    pub const USERNAME: &'static str = "username";
    pub const EMAIL: &'static str = "email";
    pub const ACCOUNT_TYPE: &'static str = "accountType";
    pub const PASSWORD: &'static str = "password";
    pub const CONFIRM_PASSWORD: &'static str = "confirmPassword";
}

fn is_blank(value: &str) -> bool {
    StringValidator::new().not_empty().validate(value).is_err()
}

/// Validate login credentials
pub fn validate_login(email: &str, password: &str) -> ValidationResult<()> {
    let mut errors = ValidationError::new();

    if is_blank(email) {
        errors.add_field_error(LoginField::EMAIL, "Email is required");
    } else if EmailValidator::new().validate(email).is_err() {
        errors.add_field_error(LoginField::EMAIL, "Invalid email format");
    }

    if is_blank(password) {
        errors.add_field_error(LoginField::PASSWORD, "Password is required");
    }

    errors.into_result()
}

/// Validate a registration form
pub fn validate_signup(form: &SignupRequest) -> ValidationResult<()> {
    let mut errors = ValidationError::new();

    if is_blank(&form.username) {
        errors.add_field_error(SignupField::USERNAME, "Username is required");
    } else if StringValidator::new().min_length(USERNAME_MIN_LENGTH).validate(&form.username).is_err()
    {
        errors.add_field_error(
            SignupField::USERNAME,
            "Username must be at least 3 characters long",
        );
    }

    if is_blank(&form.email) {
        errors.add_field_error(SignupField::EMAIL, "Email is required");
    } else if EmailValidator::new().validate(&form.email).is_err() {
        errors.add_field_error(SignupField::EMAIL, "Please enter a valid email address");
    }

    if matches!(form.account_type, None | Some(AccountType::Unknown)) {
        errors.add_field_error(SignupField::ACCOUNT_TYPE, "Please select an account type");
    }

    if form.password.is_empty() {
        errors.add_field_error(SignupField::PASSWORD, "Password is required");
    } else if !PasswordPolicy::default().is_satisfied_by(&form.password) {
        errors.add_field_error(SignupField::PASSWORD, "Password does not meet all requirements");
    }

    if form.confirm_password.is_empty() {
        errors.add_field_error(SignupField::CONFIRM_PASSWORD, "Please confirm your password");
    } else if form.confirm_password != form.password {
        errors.add_field_error(SignupField::CONFIRM_PASSWORD, "Passwords do not match");
    }

    errors.into_result()
}
