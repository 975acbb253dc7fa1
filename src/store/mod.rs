//! JSON-snapshot persistent store.
//!
//! Collections:
//! - `users`: dashboard accounts, unique email, argon2 digest or none
//! - `roles`: named permission sets referenced by users
//! - `settings`: key/value pairs with upsert semantics
//! - `sessions`: audit rows for issued bearer tokens
//!
//! ## Design
//! - Load-on-open, write-through-on-mutate: every mutation rewrites the
//!   whole snapshot before returning. No buffering, no async flush.
//! - A missing or unparseable snapshot is replaced by the seeded default
//!   dataset and persisted immediately; corruption is recovered, never
//!   surfaced.
//! - One `parking_lot::Mutex` guards the dataset, so in-process writers are
//!   fully serialized — id assignment (`max + 1`) cannot race.
//! - The snapshot write itself is a plain overwrite, not crash-atomic.

pub mod models;

pub use models::{
    NewRole, NewUser, Role, RoleUpdate, Session, Setting, User, UserStatus, UserUpdate, UserView,
};

use crate::auth::password;
use crate::error::{ApiError, ApiResult};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Password of the seeded admin account (`admin@userhub.com`).
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Full in-memory state mirrored by the on-disk snapshot.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Dataset {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    roles: Vec<Role>,
    #[serde(default)]
    settings: Vec<Setting>,
    #[serde(default)]
    sessions: Vec<Session>,
}

/// Snapshot-backed store owning all four collections.
///
/// Single-writer by construction: the store is the only component that
/// touches the snapshot file, and all operations serialize on the internal
/// mutex. External mutation of the file while the process runs is undefined
/// behavior.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    data: Mutex<Dataset>,
}

impl Store {
    /// Open (or create) the snapshot at the given path.
    ///
    /// A missing or corrupt snapshot is replaced with the seeded default
    /// dataset, which is persisted before this returns.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<Dataset>(&raw) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(
                        "snapshot at {} is corrupt ({e}); reinitializing with default data",
                        path.display()
                    );
                    seed_dataset()?
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no snapshot at {}; initializing default data", path.display());
                seed_dataset()?
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading snapshot {}", path.display()))
            }
        };

        let store = Self {
            path: path.to_path_buf(),
            data: Mutex::new(data),
        };
        {
            let data = store.data.lock();
            store.persist(&data)?;
        }
        Ok(store)
    }

    /// Serialize the dataset and overwrite the snapshot.
    /// Called with the dataset lock held by every mutating operation.
    fn persist(&self, data: &Dataset) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(data).context("serializing snapshot")?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("writing snapshot {}", self.path.display()))?;
        Ok(())
    }

    // ── Users ───────────────────────────────────────────────────────

    pub fn users(&self) -> Vec<User> {
        self.data.lock().users.clone()
    }

    pub fn user_by_id(&self, id: u64) -> Option<User> {
        self.data.lock().users.iter().find(|u| u.id == id).cloned()
    }

    /// Exact, case-sensitive email lookup.
    pub fn user_by_email(&self, email: &str) -> Option<User> {
        self.data
            .lock()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }

    /// Create a user with the next id (`max + 1`, or 1 when empty).
    /// Fails with a conflict if the email is already taken; the store is
    /// left unchanged in that case.
    pub fn create_user(&self, new: NewUser) -> ApiResult<User> {
        let mut data = self.data.lock();

        if data.users.iter().any(|u| u.email == new.email) {
            return Err(ApiError::Conflict("Email already exists".into()));
        }

        let user = User {
            id: next_id(data.users.iter().map(|u| u.id)),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            password: new.password,
            role: new.role,
            status: new.status,
            joined: new.joined,
            avatar: new.avatar,
        };
        data.users.push(user.clone());
        self.persist(&data)?;

        tracing::info!(id = user.id, email = %user.email, "user created");
        Ok(user)
    }

    /// Apply a partial-field update in place.
    pub fn update_user(&self, id: u64, updates: UserUpdate) -> ApiResult<User> {
        let mut data = self.data.lock();

        let idx = data
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

        if let Some(email) = &updates.email {
            if data.users.iter().any(|u| u.email == *email && u.id != id) {
                return Err(ApiError::Conflict("Email already exists".into()));
            }
        }

        let user = &mut data.users[idx];

        if let Some(v) = updates.first_name {
            user.first_name = v;
        }
        if let Some(v) = updates.last_name {
            user.last_name = v;
        }
        if let Some(v) = updates.email {
            user.email = v;
        }
        if let Some(v) = updates.password {
            user.password = Some(v);
        }
        if let Some(v) = updates.role {
            user.role = v;
        }
        if let Some(v) = updates.status {
            user.status = v;
        }

        let updated = user.clone();
        self.persist(&data)?;
        Ok(updated)
    }

    /// Remove a user by id. Sessions belonging to the user are left behind;
    /// callers that care run [`Store::delete_user_sessions`] explicitly.
    pub fn delete_user(&self, id: u64) -> ApiResult<bool> {
        let mut data = self.data.lock();
        let before = data.users.len();
        data.users.retain(|u| u.id != id);
        if data.users.len() == before {
            return Ok(false);
        }
        self.persist(&data)?;
        tracing::info!(id, "user deleted");
        Ok(true)
    }

    pub fn count_users_by_role(&self, role_name: &str) -> usize {
        self.data
            .lock()
            .users
            .iter()
            .filter(|u| u.role == role_name)
            .count()
    }

    // ── Roles ───────────────────────────────────────────────────────

    pub fn roles(&self) -> Vec<Role> {
        self.data.lock().roles.clone()
    }

    pub fn role_by_id(&self, id: u64) -> Option<Role> {
        self.data.lock().roles.iter().find(|r| r.id == id).cloned()
    }

    pub fn role_by_name(&self, name: &str) -> Option<Role> {
        self.data
            .lock()
            .roles
            .iter()
            .find(|r| r.name == name)
            .cloned()
    }

    pub fn create_role(&self, new: NewRole) -> ApiResult<Role> {
        let mut data = self.data.lock();

        if data.roles.iter().any(|r| r.name == new.name) {
            return Err(ApiError::Conflict("Role already exists".into()));
        }

        let role = Role {
            id: next_id(data.roles.iter().map(|r| r.id)),
            name: new.name,
            description: new.description,
            permissions: new.permissions,
            color: new.color,
            created_at: Utc::now(),
        };
        data.roles.push(role.clone());
        self.persist(&data)?;

        tracing::info!(id = role.id, name = %role.name, "role created");
        Ok(role)
    }

    /// Apply a partial-field update. Renaming cascades: every user holding
    /// the old name is rewritten to the new one in the same snapshot write.
    pub fn update_role(&self, id: u64, updates: RoleUpdate) -> ApiResult<Role> {
        let mut data = self.data.lock();

        let idx = data
            .roles
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ApiError::NotFound("Role not found".into()))?;
        let old_name = data.roles[idx].name.clone();

        if let Some(new_name) = &updates.name {
            if *new_name != old_name {
                if data.roles.iter().any(|r| r.name == *new_name) {
                    return Err(ApiError::Conflict("Role name already exists".into()));
                }
                for user in data.users.iter_mut().filter(|u| u.role == old_name) {
                    user.role = new_name.clone();
                }
            }
        }

        let role = &mut data.roles[idx];

        if let Some(v) = updates.name {
            role.name = v;
        }
        if let Some(v) = updates.description {
            role.description = v;
        }
        if let Some(v) = updates.permissions {
            role.permissions = v;
        }
        if let Some(v) = updates.color {
            role.color = v;
        }

        let updated = role.clone();
        self.persist(&data)?;
        Ok(updated)
    }

    /// Remove a role. Blocked while any user still references its name.
    pub fn delete_role(&self, id: u64) -> ApiResult<()> {
        let mut data = self.data.lock();

        let name = data
            .roles
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.name.clone())
            .ok_or_else(|| ApiError::NotFound("Role not found".into()))?;

        let referencing = data.users.iter().filter(|u| u.role == name).count();
        if referencing > 0 {
            return Err(ApiError::Integrity(format!(
                "Cannot delete role with {referencing} assigned users"
            )));
        }

        data.roles.retain(|r| r.id != id);
        self.persist(&data)?;
        tracing::info!(id, name = %name, "role deleted");
        Ok(())
    }

    // ── Settings ────────────────────────────────────────────────────

    pub fn settings(&self) -> Vec<Setting> {
        self.data.lock().settings.clone()
    }

    pub fn setting(&self, key: &str) -> Option<Setting> {
        self.data
            .lock()
            .settings
            .iter()
            .find(|s| s.key == key)
            .cloned()
    }

    /// Upsert: overwrite the value if the key exists, append otherwise.
    pub fn set_setting(&self, key: &str, value: &str) -> ApiResult<()> {
        let mut data = self.data.lock();
        match data.settings.iter_mut().find(|s| s.key == key) {
            Some(setting) => setting.value = value.to_string(),
            None => data.settings.push(Setting {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
        self.persist(&data)?;
        Ok(())
    }

    // ── Sessions ────────────────────────────────────────────────────

    /// Persist an audit row for an issued token.
    pub fn create_session(
        &self,
        user_id: u64,
        token: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> ApiResult<Session> {
        let mut data = self.data.lock();
        let session = Session {
            id: next_id(data.sessions.iter().map(|s| s.id)),
            user_id,
            token: token.to_string(),
            created_at,
            expires_at,
        };
        data.sessions.push(session.clone());
        self.persist(&data)?;
        Ok(session)
    }

    pub fn session_by_token(&self, token: &str) -> Option<Session> {
        self.data
            .lock()
            .sessions
            .iter()
            .find(|s| s.token == token)
            .cloned()
    }

    /// Remove the session row for a token (logout). The signed token itself
    /// stays verifiable until its embedded expiry — revocation is advisory.
    pub fn delete_session(&self, token: &str) -> ApiResult<bool> {
        let mut data = self.data.lock();
        let before = data.sessions.len();
        data.sessions.retain(|s| s.token != token);
        if data.sessions.len() == before {
            return Ok(false);
        }
        self.persist(&data)?;
        Ok(true)
    }

    /// Remove every session row belonging to a user. Returns the count.
    pub fn delete_user_sessions(&self, user_id: u64) -> ApiResult<usize> {
        let mut data = self.data.lock();
        let before = data.sessions.len();
        data.sessions.retain(|s| s.user_id != user_id);
        let removed = before - data.sessions.len();
        if removed > 0 {
            self.persist(&data)?;
        }
        Ok(removed)
    }
}

/// `max(existing ids) + 1`, or 1 for an empty collection.
fn next_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().map_or(1, |max| max + 1)
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

/// Build the seeded default dataset: 13 sample users (only the admin carries
/// a credential), 3 roles, 7 settings, no sessions.
fn seed_dataset() -> anyhow::Result<Dataset> {
    let admin_digest =
        password::hash(DEFAULT_ADMIN_PASSWORD).context("hashing seeded admin password")?;
    let today = Utc::now().date_naive();
    let now = Utc::now();

    let user = |id, first: &str, last: &str, email: &str, role: &str, status, joined, avatar: &str| User {
        id,
        first_name: first.into(),
        last_name: last.into(),
        email: email.into(),
        password: None,
        role: role.into(),
        status,
        joined,
        avatar: avatar.into(),
    };

    use UserStatus::{Active, Inactive, Pending};

    let mut users = vec![
        user(1, "Omar", "Gad", "admin@userhub.com", "Admin", Active, today, "#8B5CF6"),
        user(2, "Ahmed", "Hassan", "ahmed.hassan@email.com", "Admin", Active, date(2025, 8, 15), "#3B82F6"),
        user(3, "Sarah", "Johnson", "sarah.j@email.com", "Editor", Active, date(2025, 9, 20), "#8B5CF6"),
        user(4, "Mohamed", "Ali", "mohamed.ali@email.com", "User", Pending, date(2025, 10, 5), "#22C55E"),
        user(5, "Emily", "Davis", "emily.d@email.com", "Editor", Active, date(2025, 7, 12), "#F59E0B"),
        user(6, "Omar", "Khalil", "omar.k@email.com", "Admin", Active, date(2025, 6, 30), "#EF4444"),
        user(7, "Fatima", "Ahmed", "fatima.a@email.com", "User", Inactive, date(2025, 11, 18), "#EC4899"),
        user(8, "John", "Smith", "john.smith@email.com", "User", Active, date(2025, 5, 25), "#06B6D4"),
        user(9, "Mona", "Ibrahim", "mona.i@email.com", "Editor", Pending, date(2025, 12, 1), "#8B5CF6"),
        user(10, "David", "Wilson", "david.w@email.com", "User", Active, date(2025, 4, 10), "#3B82F6"),
        user(11, "Layla", "Mahmoud", "layla.m@email.com", "Admin", Active, date(2025, 3, 22), "#22C55E"),
        user(12, "James", "Brown", "james.b@email.com", "User", Inactive, date(2025, 2, 14), "#F59E0B"),
        user(13, "Nour", "Saleh", "nour.s@email.com", "Editor", Active, date(2026, 1, 5), "#EF4444"),
    ];
    users[0].password = Some(admin_digest);

    let role = |id, name: &str, description: &str, permissions: &[&str], color: &str| Role {
        id,
        name: name.into(),
        description: description.into(),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        color: color.into(),
        created_at: now,
    };

    let roles = vec![
        role(1, "Admin", "Full system access with all permissions", &["all"], "#8B5CF6"),
        role(2, "Editor", "Can create and edit content", &["read", "write", "edit"], "#3B82F6"),
        role(3, "User", "Basic access to view content", &["read"], "#64748B"),
    ];

    let setting = |key: &str, value: &str| Setting {
        key: key.into(),
        value: value.into(),
    };

    let settings = vec![
        setting("appName", "UserHub Dashboard"),
        setting("language", "en"),
        setting("theme", "light"),
        setting("emailNotifications", "true"),
        setting("twoFactorAuth", "false"),
        setting("sessionTimeout", "30"),
        setting("timezone", "UTC"),
    ];

    Ok(Dataset {
        users,
        roles,
        settings,
        sessions: Vec::new(),
    })
}

// ── Tests ───────────────────────────────────────────────────────────
