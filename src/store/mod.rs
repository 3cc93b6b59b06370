//! Persistence ports and their backends.
//!
//! The services only ever see `Arc<dyn TaskStore>` and `Arc<dyn UserStore>`;
//! [`PgStore`] and [`InMemoryStore`] implement both.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewTask, NewUser, TaskFilter, TaskRecord, TaskUpdate, User};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by store implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The addressed record does not exist.
    #[error("record not found")]
    NotFound,

    /// A write violated a uniqueness constraint.
    #[error("duplicate value violates {0}")]
    Duplicate(String),

    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Task persistence contract.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Stores a new task and returns it with its generated identifier.
    async fn create(&self, task: NewTask) -> StoreResult<TaskRecord>;

    /// Finds a task by identifier. Returns `None` when absent.
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<TaskRecord>>;

    /// Returns every task matching all criteria of `filter`, in creation order.
    async fn find_many(&self, filter: &TaskFilter) -> StoreResult<Vec<TaskRecord>>;

    /// Applies the fields present in `patch` and stamps `updated_at`.
    ///
    /// Returns `None` when the task does not exist.
    async fn update_by_id(
        &self,
        id: Uuid,
        patch: &TaskUpdate,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<TaskRecord>>;

    /// Removes a task. Returns `true` when a record was deleted.
    async fn delete_by_id(&self, id: Uuid) -> StoreResult<bool>;
}

/// User persistence contract.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Stores a new user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] when the username is already taken. The check is
    /// part of the write itself, so concurrent inserts of one username cannot both succeed.
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    /// Finds a user by exact username.
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;
}
