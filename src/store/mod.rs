//!
//! # Account Store
//!
//! The single source of truth for accounts. Handlers, the reconciler, and the
//! admin bootstrap all talk to the [`UserStore`] trait so they can run against
//! the Postgres-backed store in production and an in-memory store in tests.
//!
//! The store is where email uniqueness is enforced: `insert` reports a
//! duplicate email as `AppError::Conflict`, which the reconciler catches to
//! resolve concurrent sign-up races.

pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::User;

pub use postgres::PgUserStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new account. Fails with `AppError::Conflict` if an account
    /// with the same email already exists.
    async fn insert(&self, user: User) -> Result<User, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Looks up an account by its (normalized) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Looks up an account by the external subject id assigned by Google.
    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError>;

    /// Persists the given state of an existing account. Fails with
    /// `AppError::NotFound` if the id is unknown.
    async fn update(&self, user: User) -> Result<User, AppError>;

    /// All accounts, newest first.
    async fn list(&self) -> Result<Vec<User>, AppError>;
}
