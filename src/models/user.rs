use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::error::AppError;

/// Minimum accepted password length for local accounts.
pub const MIN_PASSWORD_LEN: usize = 4;

/// Represents the role of an account.
/// Corresponds to the `user_role` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including user administration.
    Admin,
    /// Regular account.
    User,
}

/// Represents which identity provider an account belongs to.
/// Corresponds to the `auth_provider` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "auth_provider", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Registered with an email and password.
    Local,
    /// Signed in through Google.
    Google,
}

/// Represents an account as stored in the database and returned by the API.
///
/// The password hash is carried for verification but never serialized into a
/// response body.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique identifier for the account (UUID v4).
    pub id: Uuid,
    /// Display name; mutable, non-empty.
    pub name: String,
    /// Unique, case-normalized email address.
    pub email: String,
    /// Salted bcrypt hash; present iff the account can log in locally.
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    /// Account role.
    pub role: Role,
    /// Identity provider the account currently belongs to.
    pub provider: Provider,
    /// Google's stable subject identifier, set once the account is claimed.
    pub google_id: Option<String>,
    /// Timestamp of when the account was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update to the account.
    pub updated_at: DateTime<Utc>,
}

/// Lowercases and trims an email address so lookups and uniqueness checks are
/// case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Creates a local account with a freshly hashed password.
    ///
    /// Fails with `AppError::Validation` if the password is shorter than
    /// [`MIN_PASSWORD_LEN`]. The plaintext is hashed immediately and never
    /// retained.
    pub fn new_local(name: &str, email: &str, password: &str) -> Result<Self, AppError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash: Some(hash_password(password)?),
            role: Role::User,
            provider: Provider::Local,
            google_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Creates an account originating from a Google sign-in. No local
    /// credential is set.
    pub fn new_google(name: &str, email: &str, google_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash: None,
            role: Role::User,
            provider: Provider::Google,
            google_id: Some(google_id.to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks a plaintext password against the stored hash.
    ///
    /// Returns `Ok(false)` when the account has no password hash at all (a
    /// pure-OAuth account), so local login on such accounts fails as bad
    /// credentials rather than erroring.
    pub fn verify_password(&self, password: &str) -> Result<bool, AppError> {
        match &self.password_hash {
            Some(hash) => verify_password(password, hash),
            None => Ok(false),
        }
    }

    /// Replaces the stored credential with a hash of `password`.
    pub fn set_password(&mut self, password: &str) -> Result<(), AppError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        self.password_hash = Some(hash_password(password)?);
        self.touch();
        Ok(())
    }

    /// Claims this account for Google: records the subject id (if not already
    /// set) and switches the provider, preserving any existing password hash
    /// so local login keeps working.
    ///
    /// Returns `true` if anything changed, letting callers skip the
    /// persistence write on repeat sign-ins.
    pub fn link_google(&mut self, google_id: &str) -> bool {
        let mut changed = false;
        if self.google_id.is_none() {
            self.google_id = Some(google_id.to_string());
            changed = true;
        }
        if self.provider != Provider::Google {
            self.provider = Provider::Google;
            changed = true;
        }
        if changed {
            self.touch();
        }
        changed
    }

    /// Bumps `updated_at`; call after any mutation that will be persisted.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
