use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    auth::{PasswordHasher, TokenService},
    config::Config,
    services::{IdentityService, TaskService},
    store::{
        CredentialStore, MemoryCredentialStore, MemoryTaskStore, PgCredentialStore, PgTaskStore,
        TaskStore,
    },
};

/// Everything a handler needs, registered once as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityService,
    pub tasks: TaskService,
    pub tokens: TokenService,
}

impl AppState {
    pub fn from_parts(
        credentials: Arc<dyn CredentialStore>,
        task_store: Arc<dyn TaskStore>,
        hasher: PasswordHasher,
        tokens: TokenService,
    ) -> Self {
        Self {
            identity: IdentityService::new(credentials, hasher),
            tasks: TaskService::new(task_store),
            tokens,
        }
    }

    pub fn postgres(pool: PgPool, config: &Config) -> Self {
        Self::from_parts(
            Arc::new(PgCredentialStore::new(pool.clone())),
            Arc::new(PgTaskStore::new(pool)),
            PasswordHasher::new(config.bcrypt_cost),
            TokenService::new(&config.jwt_secret, config.jwt_ttl_secs),
        )
    }

    /// Fresh, empty in-memory stores. Each call gets its own.
    pub fn in_memory(jwt_secret: &str, jwt_ttl_secs: i64, bcrypt_cost: u32) -> Self {
        Self::from_parts(
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(MemoryTaskStore::new()),
            PasswordHasher::new(bcrypt_cost),
            TokenService::new(jwt_secret, jwt_ttl_secs),
        )
    }
}
