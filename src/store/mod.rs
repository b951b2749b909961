//! Persistence ports for users and tasks.
//!
//! The services only ever talk to `CredentialStore` and `TaskStore`. Every task
//! operation here takes the owner id as part of its key, so a backend cannot be
//! asked for a task without also being told whose partition to look in.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

use crate::models::{NewUser, Task, TaskFilter, User};

pub use memory::{MemoryCredentialStore, MemoryTaskStore};
pub use postgres::{PgCredentialStore, PgTaskStore};

/// Failures reported by a store backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write. Carries the constraint or key name.
    UniqueViolation(String),
    /// Anything else the backend could not do.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::UniqueViolation(what) => write!(f, "unique violation: {}", what),
            StoreError::Backend(msg) => write!(f, "store backend error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Postgres reports unique violations with SQLSTATE 23505.
const PG_UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(db_err) = &error {
            if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return StoreError::UniqueViolation(constraint);
            }
        }
        StoreError::Backend(error.to_string())
    }
}

/// Users, keyed by a unique username.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Inserts the user. A taken username fails with `StoreError::UniqueViolation`
    /// and leaves the store untouched.
    async fn insert(&self, user: NewUser) -> Result<Uuid, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
}

/// Tasks, partitioned by owner.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, task: Task) -> Result<Task, StoreError>;

    /// Tasks of `owner_id` matching `filter`, newest first.
    async fn find_many(&self, owner_id: Uuid, filter: &TaskFilter)
        -> Result<Vec<Task>, StoreError>;

    async fn find_one(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Persists `task` over the row with the same `(id, owner_id)`. Returns `None`
    /// if that row no longer exists.
    async fn update(&self, task: Task) -> Result<Option<Task>, StoreError>;

    /// Deletes the row keyed by `(id, owner_id)` and returns the number of rows removed.
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<u64, StoreError>;
}
