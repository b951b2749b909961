//! Postgres backends over a shared `PgPool`. Schema lives in `migrations/`.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{CredentialStore, StoreError, TaskStore};
use crate::models::{NewUser, Task, TaskFilter, User};

const TASK_COLUMNS: &str = "id, title, description, status, owner_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert(&self, user: NewUser) -> Result<Uuid, StoreError> {
        // No pre-check: the unique index on username decides races.
        let (id,) = sqlx::query_as::<_, (Uuid,)>(
            "INSERT INTO users (id, username, password_hash, salt, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.salt)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, salt, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Builds the owner-scoped list query.
///
/// `strpos` gives a literal, case-sensitive substring match, so `%` and `_` in
/// the search term are not treated as wildcards.
fn list_query(owner_id: Uuid, filter: &TaskFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder =
        QueryBuilder::new(format!("SELECT {} FROM tasks WHERE owner_id = ", TASK_COLUMNS));
    builder.push_bind(owner_id);

    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(search) = &filter.search {
        builder
            .push(" AND (strpos(title, ")
            .push_bind(search.clone())
            .push(") > 0 OR strpos(description, ")
            .push_bind(search.clone())
            .push(") > 0)");
    }

    builder.push(" ORDER BY created_at DESC");
    builder
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn insert(&self, task: Task) -> Result<Task, StoreError> {
        let created = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (id, title, description, status, owner_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.owner_id)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn find_many(
        &self,
        owner_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, StoreError> {
        let tasks = list_query(owner_id, filter)
            .build_query_as::<Task>()
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn find_one(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1 AND owner_id = $2",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn update(&self, task: Task) -> Result<Option<Task>, StoreError> {
        let updated = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET title = $1, description = $2, status = $3, updated_at = $4
             WHERE id = $5 AND owner_id = $6
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.updated_at)
        .bind(task.id)
        .bind(task.owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
