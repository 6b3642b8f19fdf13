#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use learntrack::auth::reconcile::SignupMode;
use learntrack::auth::{GoogleProfile, IdentityProvider};
use learntrack::config::Config;
use learntrack::error::AppError;
use learntrack::models::user::User;
use learntrack::store::UserStore;

/// In-memory [`UserStore`] with the same contract as the Postgres store:
/// duplicate emails conflict on insert, updates require a known id, listing
/// is newest first.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: User) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|existing| existing.email == user.email) {
            return Err(AppError::Conflict("User already exists".into()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|user| user.google_id.as_deref() == Some(google_id))
            .cloned())
    }

    async fn update(&self, user: User) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(user)
            }
            None => Err(AppError::NotFound("User not found".into())),
        }
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.lock().unwrap().values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }
}

/// Store wrapper that simulates losing the create race: the first round of
/// lookups reports no match even though the backing store already holds a
/// conflicting account, so the subsequent insert hits the uniqueness
/// constraint and the caller has to resolve the conflict as a match.
pub struct RacingStore {
    pub inner: MemoryUserStore,
    finds: AtomicUsize,
}

impl RacingStore {
    pub fn new(inner: MemoryUserStore) -> Self {
        Self {
            inner,
            finds: AtomicUsize::new(0),
        }
    }

    fn pretend_unseen(&self) -> bool {
        self.finds.fetch_add(1, Ordering::SeqCst) < 2
    }
}

#[async_trait]
impl UserStore for RacingStore {
    async fn insert(&self, user: User) -> Result<User, AppError> {
        self.inner.insert(user).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        if self.pretend_unseen() {
            return Ok(None);
        }
        self.inner.find_by_email(email).await
    }

    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        if self.pretend_unseen() {
            return Ok(None);
        }
        self.inner.find_by_google_id(google_id).await
    }

    async fn update(&self, user: User) -> Result<User, AppError> {
        self.inner.update(user).await
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        self.inner.list().await
    }
}

/// Identity provider stub: any code except `bad-code` exchanges into the
/// configured profile.
pub struct StubProvider {
    pub profile: GoogleProfile,
}

impl StubProvider {
    pub fn new(profile: GoogleProfile) -> Self {
        Self { profile }
    }
}

#[async_trait]
impl IdentityProvider for StubProvider {
    fn authorize_url(&self) -> Result<String, AppError> {
        Ok("https://accounts.google.com/o/oauth2/v2/auth?client_id=stub".to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<GoogleProfile, AppError> {
        if code == "bad-code" {
            return Err(AppError::UpstreamAuth(
                "Google token exchange returned 400 Bad Request".into(),
            ));
        }
        Ok(self.profile.clone())
    }
}

pub fn google_profile(id: &str, email: Option<&str>, name: Option<&str>) -> GoogleProfile {
    GoogleProfile {
        id: id.to_string(),
        email: email.map(str::to_string),
        name: name.map(str::to_string),
        picture: Some("https://example.com/avatar.png".to_string()),
    }
}

pub const TEST_SECRET: &str = "test-secret";

pub fn test_config(signup_mode: SignupMode) -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        server_port: 8080,
        server_host: "127.0.0.1".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        frontend_url: "http://localhost:5173".to_string(),
        admin_password: "admin123".to_string(),
        signup_mode,
        google: None,
    }
}
