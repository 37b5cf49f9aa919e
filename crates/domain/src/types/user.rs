//! User identity types
//!
//! The identity record returned by login and signup and mirrored into the
//! persistent store under the `user` key.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::impl_domain_enum_conversions;

/// Kind of account a user registered as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    #[serde(rename = "INFLUENCER", alias = "influencer", alias = "Influencer")]
    Influencer,
    #[serde(rename = "BRAND", alias = "brand", alias = "Brand")]
    Brand,
    /// Role the client does not recognise; kept so the record still loads
    #[serde(rename = "UNKNOWN", other)]
    Unknown,
}

impl_domain_enum_conversions!(AccountType {
    Influencer => "influencer",
    Brand => "brand",
    Unknown => "unknown",
});

/// Identity of the signed-in user
///
/// Only the fields the client reads are typed. Everything else the server
/// sends is kept in `extra` so the persisted record round-trips unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, alias = "accountType", skip_serializing_if = "Option::is_none")]
    pub role: Option<AccountType>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Name suitable for display: username, then email, then id
    pub fn display_name(&self) -> Option<&str> {
        self.username.as_deref().or(self.email.as_deref()).or(self.id.as_deref())
    }
}
