use chrono::Utc;
use std::sync::Arc;

use crate::auth::password::{hash_password, verify_password};
use crate::error::AppError;
use crate::models::{NewUser, User};
use crate::store::{StoreError, UserStore};

/// User accounts and their password hashes.
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
    hash_cost: u32,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserStore>, hash_cost: u32) -> Self {
        Self { users, hash_cost }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.find_by_username(username).await?)
    }

    /// Hashes `password` and stores a new user.
    ///
    /// Returns `AppError::DuplicateUsername` when the store rejects the username as taken.
    pub async fn create(&self, username: &str, password: &str) -> Result<User, AppError> {
        let password_hash = self.hash(password.to_owned()).await?;
        let new_user = NewUser {
            username: username.to_owned(),
            password_hash,
            created_at: Utc::now(),
        };

        match self.users.create(new_user).await {
            Ok(user) => Ok(user),
            Err(StoreError::Duplicate(_)) => Err(AppError::DuplicateUsername),
            Err(other) => Err(other.into()),
        }
    }

    /// Checks `password` against the stored hash of `user`.
    pub async fn verify(&self, user: &User, password: &str) -> Result<bool, AppError> {
        let password = password.to_owned();
        let hashed = user.password_hash.clone();
        tokio::task::spawn_blocking(move || verify_password(&password, &hashed))
            .await
            .map_err(|e| AppError::InternalServerError(format!("Password task failed: {}", e)))?
    }

    async fn hash(&self, password: String) -> Result<String, AppError> {
        let cost = self.hash_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::InternalServerError(format!("Password task failed: {}", e)))?
    }
}
