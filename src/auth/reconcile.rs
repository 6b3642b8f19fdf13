//!
//! # Identity Reconciliation
//!
//! Maps a Google identity (email + subject id) onto the local account space.
//! An existing account is claimed rather than duplicated; an unseen identity
//! either becomes a new account immediately (auto-create mode) or is staged
//! as a pending descriptor the caller must explicitly confirm
//! (explicit-confirm mode).
//!
//! The one piece of genuine race handling in the system lives here: two
//! concurrent sign-ins for the same new email can both observe "no match", and
//! the store's uniqueness constraint rejects the losing insert with a
//! `Conflict`. That conflict is caught and resolved exactly once as a match,
//! since the account is guaranteed to exist by then.

use serde::{Deserialize, Serialize};

use crate::auth::google::GoogleProfile;
use crate::auth::CompleteSignupRequest;
use crate::error::AppError;
use crate::models::user::{normalize_email, User};
use crate::store::UserStore;

/// How an unseen Google identity is turned into an account.
///
/// The two policies are mutually exclusive deployment modes selected by
/// configuration; exactly one is active per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupMode {
    /// Create the account on first sign-in and establish a session
    /// immediately.
    AutoCreate,
    /// Stage a pending descriptor; the account is only created once the
    /// caller submits an explicit completion request.
    ExplicitConfirm,
}

/// The transient record of a not-yet-created Google account awaiting explicit
/// confirmation. Nothing is persisted until the completion request arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSignup {
    pub google_id: String,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
}

/// Outcome of reconciling a Google profile.
#[derive(Debug)]
pub enum Reconciled {
    /// The profile resolved to an account (matched, claimed, or created).
    SignedIn(User),
    /// No account exists yet; the caller must confirm before one is created.
    Pending(PendingSignup),
}

/// Reconciles a fetched Google profile against the account store.
///
/// Match precedence: subject id first (the stronger signal), then email, so a
/// user who registered locally and later clicks "Sign in with Google" under
/// the same address links to their existing account instead of erroring.
pub async fn resolve_google_profile(
    store: &dyn UserStore,
    profile: &GoogleProfile,
    mode: SignupMode,
) -> Result<Reconciled, AppError> {
    // Email is the reconciliation key; a profile without one cannot be mapped.
    let email = profile
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| AppError::Validation("Google account email is required".into()))?;

    if let Some(user) = find_linked_account(store, &profile.id, &email).await? {
        let user = claim_account(store, user, &profile.id).await?;
        return Ok(Reconciled::SignedIn(user));
    }

    let name = suggested_name(profile.name.as_deref(), &email);
    match mode {
        SignupMode::AutoCreate => {
            let user = create_or_link(store, &profile.id, &email, &name).await?;
            Ok(Reconciled::SignedIn(user))
        }
        SignupMode::ExplicitConfirm => Ok(Reconciled::Pending(PendingSignup {
            google_id: profile.id.clone(),
            email,
            name,
            avatar: profile.picture.clone(),
        })),
    }
}

/// Materializes an account from an explicit signup confirmation.
///
/// Re-runs the match step so a repeat submission, or an account created in the
/// interim, links to the existing account instead of duplicating it.
pub async fn complete_google_signup(
    store: &dyn UserStore,
    request: &CompleteSignupRequest,
) -> Result<User, AppError> {
    let email = normalize_email(&request.email);
    if let Some(user) = find_linked_account(store, &request.google_id, &email).await? {
        return claim_account(store, user, &request.google_id).await;
    }

    let name = suggested_name(Some(&request.name), &email);
    create_or_link(store, &request.google_id, &email, &name).await
}

async fn find_linked_account(
    store: &dyn UserStore,
    google_id: &str,
    email: &str,
) -> Result<Option<User>, AppError> {
    if let Some(user) = store.find_by_google_id(google_id).await? {
        return Ok(Some(user));
    }
    store.find_by_email(email).await
}

/// Links the subject id onto a matched account, persisting only when the link
/// actually changed something; repeat sign-ins are a no-op beyond token
/// reissuance.
async fn claim_account(
    store: &dyn UserStore,
    mut user: User,
    google_id: &str,
) -> Result<User, AppError> {
    if user.link_google(google_id) {
        store.update(user).await
    } else {
        Ok(user)
    }
}

async fn create_or_link(
    store: &dyn UserStore,
    google_id: &str,
    email: &str,
    name: &str,
) -> Result<User, AppError> {
    let user = User::new_google(name, email, google_id);
    match store.insert(user).await {
        Ok(created) => Ok(created),
        Err(AppError::Conflict(_)) => {
            // Lost the uniqueness race: the account exists now, so resolve
            // this attempt as a match. One retry only.
            match find_linked_account(store, google_id, email).await? {
                Some(user) => claim_account(store, user, google_id).await,
                None => Err(AppError::Conflict("User already exists".into())),
            }
        }
        Err(err) => Err(err),
    }
}

/// Display name for a new Google account: the provider's display name when
/// present, otherwise the email local-part.
fn suggested_name(name: Option<&str>, email: &str) -> String {
    match name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => email.split('@').next().unwrap_or(email).to_string(),
    }
}
