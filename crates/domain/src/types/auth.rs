//! Authentication wire types
//!
//! Request and response bodies for the `/api/auth/*` endpoints. Field names
//! follow the server's camelCase JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::user::{AccountType, User};

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

/// Registration form as filled in by the user
///
/// Carries the confirmation field and an optional account type so that
/// validation can report both. Only [`SignupPayload`] goes on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub account_type: Option<AccountType>,
}

impl SignupRequest {
    /// Wire body for this form, without the confirmation field
    ///
    /// Returns `None` when no account type was selected.
    pub fn payload(&self) -> Option<SignupPayload> {
        self.account_type.map(|account_type| SignupPayload {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            account_type,
        })
    }
}

/// Body of `POST /api/auth/signup`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupPayload {
    pub username: String,
    pub email: String,
    pub password: String,
    pub account_type: AccountType,
}

/// Successful login or signup response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub user: User,
}

/// Successful `GET /api/auth/refresh` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Error body returned by the auth endpoints
///
/// Login only fills `error`; signup may fill any combination. Fields of an
/// unexpected shape are ignored rather than failing the whole body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteErrorBody {
    #[serde(default, deserialize_with = "string_or_none")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "field_messages")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl RemoteErrorBody {
    /// Parse an error body, tolerating empty or non-JSON responses
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// Top-level message, preferring `message` over `error`; blanks skipped
    pub fn summary(&self) -> Option<&str> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|message| !message.trim().is_empty())
        }
        present(&self.message).or_else(|| present(&self.error))
    }
}

fn string_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

/// `{"field": "message"}` entries; anything else in the map is skipped
fn field_messages<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, String>>, D::Error> {
    let Value::Object(map) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    let messages: BTreeMap<String, String> = map
        .into_iter()
        .filter_map(|(field, value)| match value {
            Value::String(message) => Some((field, message)),
            _ => None,
        })
        .collect();
    Ok((!messages.is_empty()).then_some(messages))
}

/// Credential and identity installed after a successful login or signup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: User,
}

impl From<AuthResponse> for AuthSession {
    fn from(response: AuthResponse) -> Self {
        Self { access_token: response.access_token, user: response.user }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_signup_payload_excludes_confirmation() {
        let form = SignupRequest {
            username: "  maya ".to_string(),
            email: "maya@example.com".to_string(),
            password: "Str0ng!pass".to_string(),
            confirm_password: "Str0ng!pass".to_string(),
            account_type: Some(AccountType::Brand),
        };

        let body = serde_json::to_value(form.payload().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "username": "maya",
                "email": "maya@example.com",
                "password": "Str0ng!pass",
                "accountType": "BRAND"
            })
        );
    }

    #[test]
    fn test_signup_payload_requires_account_type() {
        assert!(SignupRequest::default().payload().is_none());
    }

    #[test]
    fn test_auth_response_parses_camel_case() {
        let response: AuthResponse = serde_json::from_value(json!({
            "accessToken": "tok-1",
            "user": { "email": "a@b.co" }
        }))
        .unwrap();

        assert_eq!(response.access_token, "tok-1");
        assert_eq!(response.user.email.as_deref(), Some("a@b.co"));
    }

    #[test]
    fn test_remote_error_body_summary_precedence() {
        let body = RemoteErrorBody::parse(r#"{"message": "Email taken", "error": "Conflict"}"#);
        assert_eq!(body.summary(), Some("Email taken"));

        let body = RemoteErrorBody::parse(r#"{"error": "Invalid credentials"}"#);
        assert_eq!(body.summary(), Some("Invalid credentials"));

        let body = RemoteErrorBody::parse("<html>Bad Gateway</html>");
        assert_eq!(body, RemoteErrorBody::default());
        assert_eq!(body.summary(), None);
    }

    #[test]
    fn test_remote_error_body_field_errors() {
        let body = RemoteErrorBody::parse(
            r#"{"message": "Validation failed", "errors": {"email": "Email already registered"}}"#,
        );

        let errors = body.errors.unwrap();
        assert_eq!(errors.get("email").map(String::as_str), Some("Email already registered"));
    }

    #[test]
    fn test_blank_message_falls_through_to_error() {
        let body = RemoteErrorBody::parse(r#"{"message": "", "error": "Email taken"}"#);
        assert_eq!(body.summary(), Some("Email taken"));
    }

    #[test]
    fn test_unexpected_shapes_keep_the_message() {
        let body = RemoteErrorBody::parse(r#"{"message": "Validation failed", "errors": []}"#);
        assert_eq!(body.summary(), Some("Validation failed"));
        assert_eq!(body.errors, None);

        let body = RemoteErrorBody::parse(
            r#"{"message": 42, "error": "Bad input", "errors": {"email": "Taken", "age": 3}}"#,
        );
        assert_eq!(body.message, None);
        assert_eq!(body.summary(), Some("Bad input"));
        let errors = body.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("email").map(String::as_str), Some("Taken"));
    }
}
