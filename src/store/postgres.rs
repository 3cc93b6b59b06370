//! PostgreSQL store backend built on a `sqlx` connection pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use uuid::Uuid;

use super::{StoreError, StoreResult, TaskStore, UserStore};
use crate::models::{NewTask, NewUser, TaskFilter, TaskRecord, TaskUpdate, User};

const TASK_COLUMNS: &str =
    "_id, title, description, due_date, priority, tags, user_id, status, created_at, updated_at";
const USER_COLUMNS: &str = "_id, username, password_hash, created_at";

/// Store backed by the `users` and `tasks` tables (see `migrations/`).
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool. The schema is assumed to be migrated.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `database_url` and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the database cannot be reached and
    /// [`StoreError::Backend`] when a migration fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {}", e)))?;

        Ok(Self::new(pool))
    }
}

/// Maps `sqlx` failures onto the store taxonomy.
impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> StoreError {
        match error {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::Duplicate(db.constraint().unwrap_or("unique constraint").to_string())
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Unavailable(error.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create(&self, task: NewTask) -> StoreResult<TaskRecord> {
        let sql = format!(
            "INSERT INTO tasks (title, description, due_date, priority, tags, user_id, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {}",
            TASK_COLUMNS
        );
        let record = sqlx::query_as::<_, TaskRecord>(&sql)
            .bind(task.title)
            .bind(task.description)
            .bind(task.due_date)
            .bind(task.priority)
            .bind(task.tags)
            .bind(task.user_id)
            .bind(task.status)
            .bind(task.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<TaskRecord>> {
        let sql = format!("SELECT {} FROM tasks WHERE _id = $1", TASK_COLUMNS);
        let record = sqlx::query_as::<_, TaskRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find_many(&self, filter: &TaskFilter) -> StoreResult<Vec<TaskRecord>> {
        // Conditions are appended in the same order as the binds below.
        let mut sql = format!("SELECT {} FROM tasks", TASK_COLUMNS);
        let mut conditions: Vec<String> = Vec::new();

        if filter.status.is_some() {
            conditions.push(format!("status = ${}", conditions.len() + 1));
        }
        if filter.user_id.is_some() {
            conditions.push(format!("user_id = ${}", conditions.len() + 1));
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at ASC, _id ASC");

        let mut query = sqlx::query_as::<_, TaskRecord>(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(user_id) = filter.user_id {
            query = query.bind(user_id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        patch: &TaskUpdate,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<TaskRecord>> {
        let sql = format!(
            "UPDATE tasks \
             SET title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 due_date = COALESCE($4, due_date), \
                 priority = COALESCE($5, priority), \
                 status = COALESCE($6, status), \
                 tags = COALESCE($7, tags), \
                 updated_at = $8 \
             WHERE _id = $1 \
             RETURNING {}",
            TASK_COLUMNS
        );
        let record = sqlx::query_as::<_, TaskRecord>(&sql)
            .bind(id)
            .bind(&patch.title)
            .bind(&patch.description)
            .bind(patch.due_date)
            .bind(patch.priority)
            .bind(patch.status)
            .bind(&patch.tags)
            .bind(updated_at)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE _id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (username, password_hash, created_at) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        let stored = sqlx::query_as::<_, User>(&sql)
            .bind(user.username)
            .bind(user.password_hash)
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(stored)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}
