use log::{debug, error, info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::PasswordHasher,
    error::AppError,
    models::{NewUser, User},
    store::{CredentialStore, StoreError},
};

/// Sign-up and sign-in over a `CredentialStore`.
#[derive(Clone)]
pub struct IdentityService {
    credentials: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
}

impl IdentityService {
    pub fn new(credentials: Arc<dyn CredentialStore>, hasher: PasswordHasher) -> Self {
        Self {
            credentials,
            hasher,
        }
    }

    /// Registers `username`. Returns the new user's id; does not log the user in.
    ///
    /// There is no "does this username exist?" pre-check: two concurrent sign-ups
    /// race on the store's unique constraint and exactly one wins.
    pub async fn sign_up(&self, username: &str, password: &str) -> Result<Uuid, AppError> {
        let salt = self.hasher.generate_salt();
        let password_hash = self.hash_off_thread(password, &salt).await?;

        match self
            .credentials
            .insert(NewUser::new(username, password_hash, salt))
            .await
        {
            Ok(id) => {
                info!("registered user {}", username);
                Ok(id)
            }
            Err(StoreError::UniqueViolation(constraint)) => {
                warn!("sign-up rejected, username {} taken ({})", username, constraint);
                Err(AppError::Conflict("Username already exists".into()))
            }
            Err(StoreError::Backend(msg)) => {
                error!("sign-up failed for {}: {}", username, msg);
                Err(AppError::DatabaseError(msg))
            }
        }
    }

    /// Returns the username on a credential match, `None` otherwise.
    ///
    /// Unknown user and wrong password give the same `None`.
    pub async fn sign_in(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<String>, AppError> {
        let user = match self.lookup(username).await? {
            Some(user) => user,
            None => {
                debug!("sign-in failed: unknown user {}", username);
                return Ok(None);
            }
        };

        let hasher = self.hasher;
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || {
            hasher.verify(&password, &user.salt, &user.password_hash)
        })
        .await
        .map_err(|e| AppError::InternalServerError(format!("Password check aborted: {}", e)))??;

        if matches {
            Ok(Some(username.to_string()))
        } else {
            debug!("sign-in failed: wrong password for {}", username);
            Ok(None)
        }
    }

    /// Looks up the live record behind a token subject.
    pub async fn resolve(&self, username: &str) -> Result<Option<User>, AppError> {
        self.lookup(username).await
    }

    async fn lookup(&self, username: &str) -> Result<Option<User>, AppError> {
        self.credentials
            .find_by_username(username)
            .await
            .map_err(|e| {
                error!("user lookup failed for {}: {}", username, e);
                AppError::from(e)
            })
    }

    // bcrypt is deliberately slow; keep it off the async worker.
    async fn hash_off_thread(&self, password: &str, salt: &str) -> Result<String, AppError> {
        let hasher = self.hasher;
        let password = password.to_string();
        let salt = salt.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password, &salt))
            .await
            .map_err(|e| {
                AppError::InternalServerError(format!("Password hashing aborted: {}", e))
            })?
    }
}
