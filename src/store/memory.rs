//! Process-local store backend.
//!
//! Each `InMemoryStore` value owns its own state; clones share it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, StoreResult, TaskStore, UserStore};
use crate::models::{NewTask, NewUser, TaskFilter, TaskRecord, TaskUpdate, User};

const USERNAME_CONSTRAINT: &str = "users_username_key";

/// Thread-safe in-memory store for tasks and users.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tasks: Arc<RwLock<Vec<TaskRecord>>>,
    users: Arc<RwLock<Vec<User>>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn create(&self, task: NewTask) -> StoreResult<TaskRecord> {
        let record = TaskRecord::from_new(Uuid::new_v4(), task);
        self.tasks.write().await.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<TaskRecord>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|task| task.record_id == id).cloned())
    }

    async fn find_many(&self, filter: &TaskFilter) -> StoreResult<Vec<TaskRecord>> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .iter()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect())
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        patch: &TaskUpdate,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<TaskRecord>> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks
            .iter_mut()
            .find(|task| task.record_id == id)
            .map(|task| {
                patch.apply_to(task);
                task.updated_at = Some(updated_at);
                task.clone()
            }))
    }

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<bool> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|task| task.record_id != id);
        Ok(tasks.len() != before)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        // The uniqueness check and the insert happen under one write guard.
        let mut users = self.users.write().await;
        if users.iter().any(|existing| existing.username == user.username) {
            return Err(StoreError::Duplicate(USERNAME_CONSTRAINT.to_string()));
        }
        let stored = User::from_new(Uuid::new_v4(), user);
        users.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|user| user.username == username).cloned())
    }
}
