// ── User domain types ──

use chrono::{DateTime, Utc};
use p4kit_api::Record;
use serde::Serialize;
use strum::{Display, EnumString};

/// Kind of user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserType {
    Standard,
    Operator,
    Service,
}

/// How the server checks the user's password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AuthMethod {
    Perforce,
    Ldap,
}

/// A user specification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub name: String,
    pub email: String,
    pub full_name: String,
    pub user_type: UserType,
    /// Older servers and the `users` listing may leave it out.
    pub auth_method: Option<AuthMethod>,
    /// Last time the user ran a command.
    pub access: DateTime<Utc>,
    /// Last time the specification changed.
    pub update: DateTime<Utc>,
    #[serde(skip_serializing_if = "Record::is_empty")]
    pub extra: Record,
}
