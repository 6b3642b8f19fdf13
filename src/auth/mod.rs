pub mod extractors;
pub mod google;
pub mod middleware;
pub mod password;
pub mod reconcile;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::{Role, User};

// Re-export necessary items
pub use extractors::Principal;
pub use google::{GoogleDisabled, GoogleOAuth, GoogleProfile, IdentityProvider};
pub use middleware::{AuthMiddleware, RequireRole};
pub use password::{hash_password, verify_password};
pub use reconcile::{PendingSignup, Reconciled, SignupMode};
pub use token::{Claims, TokenService, TOKEN_TTL_DAYS};

/// Represents the payload for a new account registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name for the new account. Must be non-empty.
    #[validate(length(min = 1))]
    pub name: String,
    /// Email address for the new account.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// Password for the new account.
    /// Must be at least 4 characters long.
    #[validate(length(min = 4))]
    pub password: String,
}

/// Represents the payload for a login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Account email address.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// Account password.
    #[validate(length(min = 1))]
    pub password: String,
}

/// Payload for the explicit Google signup completion step.
///
/// Mirrors the pending descriptor handed out by the callback; the avatar is
/// accepted for interface compatibility but not persisted.
#[derive(Debug, Deserialize, Validate)]
pub struct CompleteSignupRequest {
    /// Google's stable subject identifier for the account.
    #[validate(length(min = 1))]
    pub google_id: String,
    /// Email address reported by Google.
    #[validate(email)]
    pub email: String,
    /// Display name the user confirmed or edited.
    #[validate(length(min = 1))]
    pub name: String,
    pub avatar: Option<String>,
}

/// Payload for the admin user-update endpoint. Fields left unset are not
/// touched; name and role are the only externally mutable fields after
/// creation.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub role: Option<Role>,
}

/// Response structure after successful authentication (login, registration,
/// or Google signup). Contains the session token and the account, with the
/// password hash excluded by serialization.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The JWT for session authentication.
    pub token: String,
    /// The authenticated account.
    pub user: User,
}
