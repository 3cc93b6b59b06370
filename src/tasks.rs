//! Task operations on top of a [`TaskStore`].
//!
//! Every operation that addresses a single task takes an optional `scope`: the
//! verified caller. A task owned by someone else is reported as not found.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::{NewTask, Task, TaskCreate, TaskFilter, TaskUpdate};
use crate::store::TaskStore;

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

fn not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, filter: TaskFilter) -> Result<Vec<Task>, AppError> {
        let records = self.store.find_many(&filter).await?;
        Ok(records.into_iter().map(Task::from).collect())
    }

    pub async fn get(&self, id: Uuid, scope: Option<Uuid>) -> Result<Task, AppError> {
        match self.store.find_by_id(id).await? {
            Some(record) if scope.map_or(true, |owner| owner == record.user_id) => {
                Ok(record.into())
            }
            _ => Err(not_found()),
        }
    }

    /// Stores a new task owned by `user_id`. Status starts as `todo` and
    /// `updated_at` stays empty until the first update.
    pub async fn create(&self, user_id: Uuid, input: TaskCreate) -> Result<Task, AppError> {
        input.validate()?;
        let record = self
            .store
            .create(NewTask::new(input, user_id, Utc::now()))
            .await?;
        log::debug!("Created task {} for user {}", record.record_id, user_id);
        Ok(record.into())
    }

    /// Applies a partial update. `updated_at` is refreshed even when `patch` is empty.
    pub async fn update(
        &self,
        id: Uuid,
        patch: TaskUpdate,
        scope: Option<Uuid>,
    ) -> Result<Task, AppError> {
        patch.validate()?;
        if scope.is_some() {
            self.get(id, scope).await?;
        }
        self.store
            .update_by_id(id, &patch, Utc::now())
            .await?
            .map(Task::from)
            .ok_or_else(not_found)
    }

    /// Returns `true` when a task was removed.
    pub async fn delete(&self, id: Uuid, scope: Option<Uuid>) -> Result<bool, AppError> {
        if scope.is_some() {
            match self.get(id, scope).await {
                Ok(_) => {}
                Err(AppError::NotFound(_)) => return Ok(false),
                Err(other) => return Err(other),
            }
        }
        Ok(self.store.delete_by_id(id).await?)
    }
}
