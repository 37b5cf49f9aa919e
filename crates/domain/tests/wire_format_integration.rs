//! Integration tests for the auth wire format
//!
//! Exercises realistic server payloads end to end: response parsing, the
//! persisted identity record, and error bodies.

use jigsaw_domain::{AccountType, AuthResponse, AuthSession, RemoteErrorBody, User};
use serde_json::json;

#[test]
fn test_login_response_becomes_session() {
    let response: AuthResponse = serde_json::from_value(json!({
        "accessToken": "eyJhbGciOiJIUzI1NiJ9.payload.sig",
        "user": {
            "_id": "6650c3a1f1",
            "username": "ava",
            "email": "ava@example.com",
            "role": "INFLUENCER",
            "followers": 12800,
            "verified": true
        }
    }))
    .expect("login response should parse");

    let session = AuthSession::from(response);

    assert_eq!(session.access_token, "eyJhbGciOiJIUzI1NiJ9.payload.sig");
    assert_eq!(session.user.id.as_deref(), Some("6650c3a1f1"));
    assert_eq!(session.user.role, Some(AccountType::Influencer));
    assert_eq!(session.user.extra.get("followers"), Some(&json!(12800)));
}

#[test]
fn test_persisted_identity_keeps_unknown_fields() {
    let raw = json!({
        "id": "u1",
        "email": "brand@example.com",
        "accountType": "brand",
        "company": {"name": "Acme", "size": 40}
    });

    let user: User = serde_json::from_value(raw).expect("identity should parse");
    let persisted = serde_json::to_string(&user).expect("identity should serialize");
    let reloaded: User = serde_json::from_str(&persisted).expect("identity should reload");

    assert_eq!(reloaded, user);
    assert_eq!(reloaded.role, Some(AccountType::Brand));
    assert_eq!(reloaded.extra.get("company"), Some(&json!({"name": "Acme", "size": 40})));
    assert_eq!(reloaded.display_name(), Some("brand@example.com"));
}

#[test]
fn test_unrecognised_role_still_loads() {
    let user: User = serde_json::from_value(json!({"username": "ops", "role": "ADMIN"}))
        .expect("identity with unknown role should parse");

    assert_eq!(user.role, Some(AccountType::Unknown));
}

#[test]
fn test_signup_error_body_with_field_errors() {
    let body = RemoteErrorBody::parse(
        r#"{
            "message": "Validation failed",
            "errors": {"username": "Username taken", "email": "Email already registered"}
        }"#,
    );

    assert_eq!(body.summary(), Some("Validation failed"));
    let errors = body.errors.expect("field errors");
    assert_eq!(errors.len(), 2);
    assert_eq!(errors.get("username").map(String::as_str), Some("Username taken"));
}

#[test]
fn test_blank_messages_are_not_summaries() {
    let body = RemoteErrorBody::parse(r#"{"message": "   "}"#);
    assert_eq!(body.summary(), None);
}
