//!
//! # Admin Bootstrap
//!
//! Startup routine guaranteeing a deterministic administrator account. Runs
//! exactly once, before the server starts accepting connections; the caller
//! treats a failure as fatal since the admin account is a required
//! operational invariant.

use crate::error::AppError;
use crate::models::user::{Role, User, MIN_PASSWORD_LEN};
use crate::store::UserStore;

/// The fixed administrator email the bootstrap looks up.
pub const ADMIN_EMAIL: &str = "admin@gmail.com";

/// Fallback administrator password when `ADMIN_PASSWORD` is not configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Ensures exactly one administrator account exists with a known role and a
/// password matching the configured value.
///
/// If the account is missing it is created (provider local, role admin). If
/// it exists, the role is promoted back to admin if it had drifted, and the
/// password is reset whenever the configured value meets the minimum length
/// and does not already verify. Resetting on every configuration change makes
/// the admin credential deterministic across restarts and redeploys, at the
/// documented cost that an operator-changed admin password does not survive a
/// redeploy.
///
/// Idempotent: a `changed` flag guards the persistence call, so a repeat run
/// with the same configured password performs no write.
pub async fn ensure_admin_user(
    store: &dyn UserStore,
    admin_password: &str,
) -> Result<User, AppError> {
    match store.find_by_email(ADMIN_EMAIL).await? {
        Some(mut user) => {
            let mut changed = false;
            if user.role != Role::Admin {
                user.role = Role::Admin;
                user.touch();
                changed = true;
            }
            if admin_password.len() >= MIN_PASSWORD_LEN && !user.verify_password(admin_password)? {
                user.set_password(admin_password)?;
                changed = true;
            }
            if changed {
                store.update(user).await
            } else {
                Ok(user)
            }
        }
        None => {
            let mut user = User::new_local("Administrator", ADMIN_EMAIL, admin_password)?;
            user.role = Role::Admin;
            store.insert(user).await
        }
    }
}
