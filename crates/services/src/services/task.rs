use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use db::{
    DbErr, DbPool,
    models::{
        comment::Comment,
        counter::{self, TASK_SEQUENCE},
        history::{CreateHistory, HistoryAction, HistoryEntry, HistoryWithTask},
        notification::{Notification, NotificationKind},
        project::Project,
        task::{TASK_NOT_FOUND, Task, TaskFields, TaskFilter, TaskPriority, TaskStatus},
        user::User,
    },
};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

pub const RECENT_HISTORY_DEFAULT: u64 = 100;
pub const RECENT_HISTORY_MAX: u64 = 500;

#[derive(Debug, Error)]
pub enum TaskServiceError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Task not found")]
    TaskNotFound,
}

pub type Result<T> = std::result::Result<T, TaskServiceError>;

/// A missing task row is a 404; a missing project, assignee or author
/// referenced by the write is a validation failure.
fn write_error(err: DbErr) -> TaskServiceError {
    match err {
        DbErr::RecordNotFound(msg) if msg == TASK_NOT_FOUND => TaskServiceError::TaskNotFound,
        DbErr::RecordNotFound(msg) => TaskServiceError::Validation(msg),
        other => TaskServiceError::Database(other),
    }
}

/// Body of task create and update requests. Update is a full replace.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    #[ts(type = "string | null")]
    pub project_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    #[ts(type = "string | null")]
    pub assigned_to_id: Option<String>,
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "hours")]
    #[ts(type = "number | null")]
    pub estimated_hours: Option<f64>,
    #[serde(default, deserialize_with = "hours")]
    #[ts(type = "number | null")]
    pub actual_hours: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub search_text: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateComment {
    pub comment_text: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Text(String),
    Number(f64),
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Loose>::deserialize(deserializer)?.map(|value| match value {
        Loose::Text(text) => text,
        Loose::Number(number) => number.to_string(),
    }))
}

fn hours<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Number(number)) => Ok(Some(number)),
        Some(Loose::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Loose::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid hours value '{text}'"))),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `None` for absent, empty or `"0"` references.
fn reference_id(value: Option<&str>, what: &str) -> Result<Option<Uuid>> {
    match non_blank(value) {
        None | Some("0") => Ok(None),
        Some(raw) => Uuid::parse_str(raw)
            .map(Some)
            .map_err(|_| TaskServiceError::Validation(format!("Invalid {what}"))),
    }
}

fn parse_status(value: Option<&str>) -> Result<Option<TaskStatus>> {
    non_blank(value)
        .map(|raw| {
            TaskStatus::from_str(raw)
                .map_err(|_| TaskServiceError::Validation(format!("Invalid status '{raw}'")))
        })
        .transpose()
}

fn parse_priority(value: Option<&str>) -> Result<Option<TaskPriority>> {
    non_blank(value)
        .map(|raw| {
            TaskPriority::from_str(raw)
                .map_err(|_| TaskServiceError::Validation(format!("Invalid priority '{raw}'")))
        })
        .transpose()
}

/// Accepts `YYYY-MM-DD` or RFC 3339. Anything else is treated as no due date.
pub fn parse_due_date(value: Option<&str>) -> Option<NaiveDate> {
    let raw = non_blank(value)?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

fn validate_hours(value: Option<f64>, what: &str) -> Result<Option<f64>> {
    match value {
        Some(hours) if !hours.is_finite() || hours < 0.0 => Err(TaskServiceError::Validation(
            format!("{what} must be a non-negative number"),
        )),
        other => Ok(other),
    }
}

#[derive(Clone, Default)]
pub struct TaskService;

impl TaskService {
    pub fn new() -> Self {
        Self
    }

    /// Validates the payload and resolves references. Performs no writes.
    async fn resolve_fields(
        &self,
        pool: &DbPool,
        payload: &TaskPayload,
        previous_actual_hours: f64,
    ) -> Result<TaskFields> {
        let title = non_blank(payload.title.as_deref())
            .ok_or_else(|| TaskServiceError::Validation("Title is required".to_string()))?
            .to_string();
        let status = parse_status(payload.status.as_deref())?.unwrap_or_default();
        let priority = parse_priority(payload.priority.as_deref())?.unwrap_or_default();

        let project_id = reference_id(payload.project_id.as_deref(), "project")?;
        if let Some(id) = project_id
            && Project::find_by_id(pool, id).await?.is_none()
        {
            return Err(TaskServiceError::Validation("Invalid project".to_string()));
        }

        let assigned_to_id = reference_id(payload.assigned_to_id.as_deref(), "assignee")?;
        if let Some(id) = assigned_to_id
            && User::find_by_id(pool, id).await?.is_none()
        {
            return Err(TaskServiceError::Validation("Invalid assignee".to_string()));
        }

        let estimated_hours = validate_hours(payload.estimated_hours, "estimatedHours")?;
        let actual_hours = validate_hours(payload.actual_hours, "actualHours")?;

        Ok(TaskFields {
            title,
            description: payload.description.clone().unwrap_or_default(),
            status,
            priority,
            project_id,
            assigned_to_id,
            due_date: parse_due_date(payload.due_date.as_deref()),
            estimated_hours: estimated_hours.unwrap_or(0.0),
            actual_hours: actual_hours.unwrap_or(previous_actual_hours),
        })
    }

    async fn record(
        &self,
        pool: &DbPool,
        task_id: Uuid,
        actor: Uuid,
        action: HistoryAction,
        old_value: &str,
        new_value: &str,
    ) -> Result<()> {
        HistoryEntry::create(
            pool,
            &CreateHistory {
                task_id,
                user_id: actor,
                action,
                old_value: old_value.to_string(),
                new_value: new_value.to_string(),
            },
        )
        .await?;
        Ok(())
    }

    pub async fn list(&self, pool: &DbPool, query: &TaskQuery) -> Result<Vec<Task>> {
        let project_id = match non_blank(query.project_id.as_deref()) {
            None | Some("0") => None,
            // An id that cannot exist matches nothing.
            Some(raw) => match Uuid::parse_str(raw) {
                Ok(id) => Some(id),
                Err(_) => return Ok(Vec::new()),
            },
        };
        let filter = TaskFilter {
            search_text: non_blank(query.search_text.as_deref()).map(str::to_string),
            status: parse_status(query.status.as_deref())?,
            priority: parse_priority(query.priority.as_deref())?,
            project_id,
        };
        Ok(Task::find_filtered(pool, &filter).await?)
    }

    pub async fn get(&self, pool: &DbPool, id: Uuid) -> Result<Task> {
        Task::find_by_id(pool, id)
            .await?
            .ok_or(TaskServiceError::TaskNotFound)
    }

    /// Creates a task, its `CREATED` history row and, when assigned, a
    /// `task_assigned` notification. The task number is reserved only after
    /// validation succeeds.
    pub async fn create(&self, pool: &DbPool, actor: Uuid, payload: &TaskPayload) -> Result<Task> {
        let mut fields = self.resolve_fields(pool, payload, 0.0).await?;
        // Actual hours are tracked through updates only.
        fields.actual_hours = 0.0;

        let task_no = counter::next_value(pool, TASK_SEQUENCE).await?;
        let task = Task::create(pool, &fields, task_no, actor, Uuid::new_v4()).await?;
        tracing::debug!(task_id = %task.id, task_no, "Task created");

        self.record(pool, task.id, actor, HistoryAction::Created, "", &task.title)
            .await?;

        if let Some(assignee) = &task.assigned_to {
            Notification::create(
                pool,
                assignee.id,
                &format!("Nueva tarea asignada: {}", task.title),
                NotificationKind::TaskAssigned,
            )
            .await?;
        }

        Ok(task)
    }

    /// Full replace of the task's mutable fields. Emits one history row per
    /// changed status or title and notifies the current assignee.
    pub async fn update(
        &self,
        pool: &DbPool,
        actor: Uuid,
        existing: &Task,
        payload: &TaskPayload,
    ) -> Result<Task> {
        let fields = self
            .resolve_fields(pool, payload, existing.actual_hours)
            .await?;
        let updated = Task::update(pool, existing.id, &fields)
            .await
            .map_err(write_error)?;

        if existing.status != updated.status {
            self.record(
                pool,
                updated.id,
                actor,
                HistoryAction::StatusChanged,
                &existing.status.to_string(),
                &updated.status.to_string(),
            )
            .await?;
        }
        if existing.title != updated.title {
            self.record(
                pool,
                updated.id,
                actor,
                HistoryAction::TitleChanged,
                &existing.title,
                &updated.title,
            )
            .await?;
        }

        if let Some(assignee) = &updated.assigned_to {
            Notification::create(
                pool,
                assignee.id,
                &format!("Tarea actualizada: {}", updated.title),
                NotificationKind::TaskUpdated,
            )
            .await?;
        }

        Ok(updated)
    }

    /// Records `DELETED`, removes the task's comments, then the task.
    /// History rows are kept.
    pub async fn delete(&self, pool: &DbPool, actor: Uuid, existing: &Task) -> Result<()> {
        self.record(
            pool,
            existing.id,
            actor,
            HistoryAction::Deleted,
            &existing.title,
            "",
        )
        .await?;
        let comments = Comment::delete_by_task_id(pool, existing.id).await?;
        let rows = Task::delete(pool, existing.id).await?;
        if rows == 0 {
            return Err(TaskServiceError::TaskNotFound);
        }
        tracing::debug!(task_id = %existing.id, comments, "Task deleted");
        Ok(())
    }

    pub async fn comments(&self, pool: &DbPool, task: &Task) -> Result<Vec<Comment>> {
        Ok(Comment::find_by_task_id(pool, task.id).await?)
    }

    pub async fn add_comment(
        &self,
        pool: &DbPool,
        actor: Uuid,
        task: &Task,
        payload: &CreateComment,
    ) -> Result<Comment> {
        let text = non_blank(payload.comment_text.as_deref()).ok_or_else(|| {
            TaskServiceError::Validation("Comment text cannot be empty".to_string())
        })?;
        Comment::create(pool, task.id, actor, text)
            .await
            .map_err(write_error)
    }

    /// Audit trail for a task id, including tasks that were deleted.
    pub async fn history(&self, pool: &DbPool, task_id: Uuid) -> Result<Vec<HistoryEntry>> {
        Ok(HistoryEntry::find_by_task_id(pool, task_id).await?)
    }

    pub async fn recent_history(
        &self,
        pool: &DbPool,
        limit: Option<u64>,
    ) -> Result<Vec<HistoryWithTask>> {
        let limit = match limit {
            None | Some(0) => RECENT_HISTORY_DEFAULT,
            Some(limit) => limit.min(RECENT_HISTORY_MAX),
        };
        Ok(HistoryEntry::find_recent(pool, limit).await?)
    }
}
