//! Session types

use jigsaw_domain::{impl_domain_enum_conversions, User};
use serde::{Deserialize, Serialize};

/// Credential and identity as held in memory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: Option<String>,
    pub user: Option<User>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// The user asked to log out
    UserLogout,
    /// Credential renewal failed and the session was cleared
    RefreshFailed,
    /// Another context removed the persisted credential
    ExternalChange,
}

impl_domain_enum_conversions!(LogoutReason {
    UserLogout => "user_logout",
    RefreshFailed => "refresh_failed",
    ExternalChange => "external_change",
});

/// Session lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuthEvent {
    /// Login or signup installed a new session
    SessionStarted { user: User },
    /// The credential was renewed in place
    TokenRefreshed,
    /// Another context changed the persisted credential
    SessionSynced,
    LoggedOut { reason: LogoutReason },
}

impl AuthEvent {
    pub const fn is_logout(&self) -> bool {
        matches!(self, Self::LoggedOut { .. })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_logout_reason_conversions() {
        assert_eq!(LogoutReason::RefreshFailed.to_string(), "refresh_failed");
        assert_eq!("External_Change".parse::<LogoutReason>().unwrap(), LogoutReason::ExternalChange);
        assert!("timeout".parse::<LogoutReason>().is_err());
    }

    #[test]
    fn test_auth_event_serialization() {
        let event = AuthEvent::LoggedOut { reason: LogoutReason::UserLogout };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "event": "logged_out", "reason": "user_logout" })
        );
        assert!(event.is_logout());
        assert!(!AuthEvent::TokenRefreshed.is_logout());
    }
}
