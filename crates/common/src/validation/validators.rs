// Field Validators - Reusable validation components
use once_cell::sync::Lazy;

/// Trait for field validators
pub trait FieldValidator<T: ?Sized> {
    /// Validate a field value
    fn validate(&self, value: &T) -> Result<(), String>;
}

/// String validator with length constraints
///
/// Lengths are counted in characters, after trimming unless disabled.
#[derive(Debug, Clone)]
pub struct StringValidator {
    min_length: Option<usize>,
    max_length: Option<usize>,
    not_empty: bool,
    trim: bool,
}

impl Default for StringValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl StringValidator {
    /// Create a new string validator
    pub fn new() -> Self {
        Self { min_length: None, max_length: None, not_empty: false, trim: true }
    }

    /// Require non-empty string
    pub fn not_empty(mut self) -> Self {
        self.not_empty = true;
        self
    }

    /// Set minimum length
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Set maximum length
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Set whether to trim before validation
    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }
}

impl FieldValidator<str> for StringValidator {
    fn validate(&self, value: &str) -> Result<(), String> {
        let val = if self.trim { value.trim() } else { value };
        let len = val.chars().count();

        if self.not_empty && val.is_empty() {
            return Err("Value cannot be empty".to_string());
        }

        if let Some(min) = self.min_length {
            if len < min {
                return Err(format!("Length must be at least {min} characters"));
            }
        }

        if let Some(max) = self.max_length {
            if len > max {
                return Err(format!("Length must not exceed {max} characters"));
            }
        }

        Ok(())
    }
}

impl FieldValidator<String> for StringValidator {
    fn validate(&self, value: &String) -> Result<(), String> {
        FieldValidator::<str>::validate(self, value.as_str())
    }
}

/// Something, then `@`, then something containing a dot; no whitespace
static EMAIL_REGEX: Lazy<Result<regex::Regex, regex::Error>> =
    Lazy::new(|| regex::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));

/// Email validator
#[derive(Debug, Clone, Default)]
pub struct EmailValidator;

impl EmailValidator {
    /// Create a new email validator
    pub fn new() -> Self {
        Self
    }
}

impl FieldValidator<str> for EmailValidator {
    fn validate(&self, value: &str) -> Result<(), String> {
        let regex = EMAIL_REGEX.as_ref().map_err(|e| format!("Email pattern unavailable: {e}"))?;
        if !regex.is_match(value) {
            return Err("Invalid email format".to_string());
        }

        Ok(())
    }
}

impl FieldValidator<String> for EmailValidator {
    fn validate(&self, value: &String) -> Result<(), String> {
        FieldValidator::<str>::validate(self, value.as_str())
    }
}

/// Characters accepted as the "special character" class
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// One password rule and whether a candidate satisfies it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordRequirement {
    pub label: String,
    pub met: bool,
}

/// Password strength policy used at signup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

impl PasswordPolicy {
    /// Every enabled rule with its status for `password`, in display order
    pub fn requirements(&self, password: &str) -> Vec<PasswordRequirement> {
        let mut requirements = vec![PasswordRequirement {
            label: format!("At least {} characters", self.min_length),
            met: password.chars().count() >= self.min_length,
        }];

        let rules = [
            (self.require_uppercase, "One uppercase letter", password.chars().any(|c| c.is_ascii_uppercase())),
            (self.require_lowercase, "One lowercase letter", password.chars().any(|c| c.is_ascii_lowercase())),
            (self.require_digit, "One number", password.chars().any(|c| c.is_ascii_digit())),
            (
                self.require_special,
                "One special character",
                password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)),
            ),
        ];
        requirements.extend(
            rules
                .into_iter()
                .filter(|(enabled, _, _)| *enabled)
                .map(|(_, label, met)| PasswordRequirement { label: label.to_string(), met }),
        );
        requirements
    }

    /// Labels of the rules `password` fails
    pub fn unmet(&self, password: &str) -> Vec<String> {
        self.requirements(password).into_iter().filter(|r| !r.met).map(|r| r.label).collect()
    }

    pub fn is_satisfied_by(&self, password: &str) -> bool {
        self.requirements(password).iter().all(|r| r.met)
    }
}

impl FieldValidator<str> for PasswordPolicy {
    fn validate(&self, value: &str) -> Result<(), String> {
        let unmet = self.unmet(value);
        if unmet.is_empty() {
            Ok(())
        } else {
            Err(format!("Password is missing: {}", unmet.join(", ")))
        }
    }
}

impl FieldValidator<String> for PasswordPolicy {
    fn validate(&self, value: &String) -> Result<(), String> {
        FieldValidator::<str>::validate(self, value.as_str())
    }
}
