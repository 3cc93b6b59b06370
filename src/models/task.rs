use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Medium priority.
    #[default]
    Medium,
    /// High priority.
    High,
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    Todo,
    /// Task is currently being worked on.
    InProgress,
    /// Task is completed.
    Done,
}

/// Parses a due date given either as an RFC 3339 timestamp or as a plain
/// `YYYY-MM-DD` date, which is taken as midnight UTC.
pub fn parse_due_date(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
        .ok_or_else(|| format!("invalid due_date '{}', expected an ISO-8601 date", value))
}

fn deserialize_due_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|value| parse_due_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

/// Request body for creating a task.
///
/// Any `status` sent by the client is ignored: new tasks always start as `todo`.
#[derive(Debug, Deserialize, Validate)]
pub struct TaskCreate {
    /// The title of the task.
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// An optional description for the task.
    /// Maximum length of 1000 characters if provided.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Optional due date, RFC 3339 or `YYYY-MM-DD`.
    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<DateTime<Utc>>,

    /// Defaults to `medium` when omitted.
    pub priority: Option<TaskPriority>,

    /// Defaults to an empty list when omitted.
    pub tags: Option<Vec<String>>,

    /// Owner of the task for unauthenticated callers. Ignored when the caller
    /// presented a verified token.
    #[serde(rename = "userId")]
    pub user_id: Option<Uuid>,
}

/// Partial update of a task. Only the fields that are present change.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<DateTime<Utc>>,

    pub priority: Option<TaskPriority>,

    pub status: Option<TaskStatus>,

    pub tags: Option<Vec<String>>,
}

impl TaskUpdate {
    /// Writes every present field onto `record`.
    pub fn apply_to(&self, record: &mut TaskRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(description) = &self.description {
            record.description = Some(description.clone());
        }
        if let Some(due_date) = self.due_date {
            record.due_date = Some(due_date);
        }
        if let Some(priority) = self.priority {
            record.priority = priority;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(tags) = &self.tags {
            record.tags = tags.clone();
        }
    }
}

/// A task that has not been stored yet. The store assigns its identifier.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: TaskPriority,
    pub tags: Vec<String>,
    pub user_id: Uuid,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

impl NewTask {
    /// Builds a new task for `user_id` from client input, filling in the defaults:
    /// status `todo`, priority `medium`, no tags, `created_at` set to `now`.
    pub fn new(input: TaskCreate, user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            title: input.title,
            description: input.description,
            due_date: input.due_date,
            priority: input.priority.unwrap_or_default(),
            tags: input.tags.unwrap_or_default(),
            user_id,
            status: TaskStatus::Todo,
            created_at: now,
        }
    }
}

/// A task as the store holds it. The identifier lives under the store's own
/// name (`_id`) and is translated to `id` by the conversion into [`Task`].
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct TaskRecord {
    #[sqlx(rename = "_id")]
    pub record_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: TaskPriority,
    pub tags: Vec<String>,
    pub user_id: Uuid,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    /// Materialises a [`NewTask`] under the given identifier.
    pub fn from_new(record_id: Uuid, task: NewTask) -> Self {
        Self {
            record_id,
            title: task.title,
            description: task.description,
            due_date: task.due_date,
            priority: task.priority,
            tags: task.tags,
            user_id: task.user_id,
            status: task.status,
            created_at: task.created_at,
            updated_at: None,
        }
    }
}

/// Represents a task as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier for the task.
    pub id: Uuid,
    /// The title of the task.
    pub title: String,
    /// An optional description for the task.
    pub description: Option<String>,
    /// Optional due date for the task.
    pub due_date: Option<DateTime<Utc>>,
    /// The priority of the task.
    pub priority: TaskPriority,
    /// Free-form labels.
    pub tags: Vec<String>,
    /// Identifier of the user who owns the task.
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    /// The current status of the task.
    pub status: TaskStatus,
    /// Timestamp of when the task was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update, `null` until the first update.
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        Self {
            id: record.record_id,
            title: record.title,
            description: record.description,
            due_date: record.due_date,
            priority: record.priority,
            tags: record.tags,
            user_id: record.user_id,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Criteria for listing tasks. All present criteria must match.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub user_id: Option<Uuid>,
}

impl TaskFilter {
    pub fn matches(&self, record: &TaskRecord) -> bool {
        self.status.map_or(true, |status| record.status == status)
            && self.user_id.map_or(true, |user_id| record.user_id == user_id)
    }
}

/// Query parameters accepted by the task listing endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    /// Filter tasks by status.
    pub status: Option<TaskStatus>,
    /// Owner to list for when the caller has no verified token.
    #[serde(rename = "userId")]
    pub user_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn create_input(value: serde_json::Value) -> TaskCreate {
        serde_json::from_value(value).unwrap()
    }

    fn sample_record() -> TaskRecord {
        let input = create_input(json!({
            "title": "Write report",
            "description": "Quarterly numbers",
            "tags": ["work"]
        }));
        TaskRecord::from_new(Uuid::new_v4(), NewTask::new(input, Uuid::new_v4(), Utc::now()))
    }

    #[test]
    fn test_new_task_defaults() {
        let user_id = Uuid::new_v4();
        let task = NewTask::new(create_input(json!({ "title": "Buy milk" })), user_id, Utc::now());

        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(task.tags.is_empty());
        assert_eq!(task.user_id, user_id);
    }

    #[test]
    fn test_client_status_is_ignored_on_create() {
        let input = create_input(json!({ "title": "Ship it", "status": "done" }));
        let task = NewTask::new(input, Uuid::new_v4(), Utc::now());
        assert_eq!(task.status, TaskStatus::Todo);
    }

    #[test]
    fn test_task_validation() {
        let valid = create_input(json!({ "title": "Valid Task", "description": "ok" }));
        assert!(valid.validate().is_ok());

        let empty_title = create_input(json!({ "title": "" }));
        assert!(empty_title.validate().is_err());

        let long_description = create_input(json!({
            "title": "Valid title",
            "description": "b".repeat(1001)
        }));
        assert!(long_description.validate().is_err());

        let empty_update_title = TaskUpdate {
            title: Some(String::new()),
            ..TaskUpdate::default()
        };
        assert!(empty_update_title.validate().is_err());
        assert!(TaskUpdate::default().validate().is_ok());
    }

    #[test]
    fn test_due_date_formats() {
        let timestamp = create_input(json!({ "title": "a", "due_date": "2024-05-01T10:30:00+02:00" }));
        assert_eq!(
            timestamp.due_date,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap())
        );

        let date_only = create_input(json!({ "title": "a", "due_date": "2024-05-01" }));
        assert_eq!(
            date_only.due_date,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );

        let null = create_input(json!({ "title": "a", "due_date": null }));
        assert_eq!(null.due_date, None);

        let invalid: Result<TaskCreate, _> =
            serde_json::from_value(json!({ "title": "a", "due_date": "next tuesday" }));
        assert!(invalid.is_err());
    }

    #[test]
    fn test_update_changes_only_present_fields() {
        let original = sample_record();
        let mut updated = original.clone();
        let patch = TaskUpdate {
            status: Some(TaskStatus::Done),
            ..TaskUpdate::default()
        };
        patch.apply_to(&mut updated);

        assert_eq!(updated.status, TaskStatus::Done);
        assert_eq!(
            TaskRecord {
                status: original.status,
                ..updated
            },
            original
        );
    }

    #[test]
    fn test_api_task_hides_internal_id() {
        let record = sample_record();
        let record_id = record.record_id;
        let value = serde_json::to_value(Task::from(record)).unwrap();

        assert_eq!(value["id"], json!(record_id));
        assert!(value.get("_id").is_none());
        assert!(value.get("record_id").is_none());
        assert!(value["updated_at"].is_null());
        assert_eq!(value["priority"], "medium");
        assert_eq!(value["status"], "todo");
    }

    #[test]
    fn test_filter_is_a_conjunction() {
        let record = sample_record();
        let owner = record.user_id;

        assert!(TaskFilter::default().matches(&record));
        assert!(TaskFilter {
            status: Some(TaskStatus::Todo),
            user_id: Some(owner),
        }
        .matches(&record));
        assert!(!TaskFilter {
            status: Some(TaskStatus::Todo),
            user_id: Some(Uuid::new_v4()),
        }
        .matches(&record));
        assert!(!TaskFilter {
            status: Some(TaskStatus::Done),
            user_id: Some(owner),
        }
        .matches(&record));
    }
}
