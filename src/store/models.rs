//! Record types persisted in the snapshot.
//!
//! Field names serialize in camelCase so the on-disk snapshot and the wire
//! payloads keep the exact shape the dashboard front end already consumes
//! (`firstName`, `createdAt`, …).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    Active,
    Pending,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Pending => "Pending",
            Self::Inactive => "Inactive",
        }
    }
}

/// A dashboard user account.
///
/// `password` holds an argon2 PHC digest, never plaintext. Seeded sample
/// users carry no digest at all — those accounts can never authenticate by
/// password ("no local credential" state).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    /// Unique across all users, compared case-sensitively as stored.
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Role name. References a `Role` by name, not enforced as a foreign key.
    pub role: String,
    pub status: UserStatus,
    /// Calendar date the account joined.
    pub joined: NaiveDate,
    /// Display color token for the avatar badge.
    pub avatar: String,
}

/// API view of a [`User`] — identical fields minus the password digest.
///
/// Every outbound user record goes through this type; the digest must never
/// appear in a response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub status: UserStatus,
    pub joined: NaiveDate,
    pub avatar: String,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            email: u.email.clone(),
            role: u.role.clone(),
            status: u.status,
            joined: u.joined,
            avatar: u.avatar.clone(),
        }
    }
}

/// A role grouping a set of capability strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: u64,
    /// Unique role name; users reference roles by this string.
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// A single key/value configuration entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

/// Audit row for an issued bearer token.
///
/// The token's embedded expiry is authoritative for access decisions; this
/// row exists for enumeration and logout bookkeeping only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: u64,
    pub user_id: u64,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Input for [`Store::create_user`](super::Store::create_user).
/// `password` is an already-hashed digest (or absent).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: Option<String>,
    pub role: String,
    pub status: UserStatus,
    pub joined: NaiveDate,
    pub avatar: String,
}

/// Partial-field update for [`Store::update_user`](super::Store::update_user).
/// `None` leaves the field unchanged; `password` is an already-hashed digest.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub status: Option<UserStatus>,
}

/// Input for [`Store::create_role`](super::Store::create_role).
#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
    pub color: String,
}

/// Partial-field update for [`Store::update_role`](super::Store::update_role).
#[derive(Debug, Clone, Default)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub color: Option<String>,
}
