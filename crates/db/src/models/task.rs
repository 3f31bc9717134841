use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    ids,
    project::{Project, ProjectRef},
    user::{User, UserRef},
};
pub use crate::types::{TaskPriority, TaskStatus};
use crate::entities::task;

/// `RecordNotFound` message used when the task row itself is missing.
pub const TASK_NOT_FOUND: &str = "Task not found";

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub task_no: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// `None` when unset or when the referenced project no longer exists.
    pub project: Option<ProjectRef>,
    pub assigned_to: Option<UserRef>,
    #[ts(type = "string | null")]
    pub due_date: Option<NaiveDate>,
    pub estimated_hours: f64,
    pub actual_hours: f64,
    pub created_by: Option<UserRef>,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

/// Minimal task identity used when listing history across tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub id: Uuid,
    pub task_no: i64,
    pub title: String,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub search_text: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub project_id: Option<Uuid>,
}

/// Validated, normalized field values written on create and update.
#[derive(Debug, Clone)]
pub struct TaskFields {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub project_id: Option<Uuid>,
    pub assigned_to_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub estimated_hours: f64,
    pub actual_hours: f64,
}

impl Task {
    fn from_model_with(
        model: task::Model,
        projects: &HashMap<i64, ProjectRef>,
        users: &HashMap<i64, UserRef>,
    ) -> Self {
        Self {
            id: model.uuid,
            task_no: model.task_no,
            title: model.title,
            description: model.description,
            status: model.status,
            priority: model.priority,
            project: model.project_id.and_then(|id| projects.get(&id).cloned()),
            assigned_to: model.assigned_to_id.and_then(|id| users.get(&id).cloned()),
            due_date: model.due_date,
            estimated_hours: model.estimated_hours,
            actual_hours: model.actual_hours,
            created_by: users.get(&model.created_by_id).cloned(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    async fn from_model<C: ConnectionTrait>(db: &C, model: task::Model) -> Result<Self, DbErr> {
        let mut projects = HashMap::new();
        if let Some(id) = model.project_id
            && let Some(project) = Project::ref_by_row_id(db, id).await?
        {
            projects.insert(id, project);
        }

        let mut users = HashMap::new();
        for id in [model.assigned_to_id, Some(model.created_by_id)]
            .into_iter()
            .flatten()
        {
            if users.contains_key(&id) {
                continue;
            }
            if let Some(user) = User::ref_by_row_id(db, id).await? {
                users.insert(id, user);
            }
        }

        Ok(Self::from_model_with(model, &projects, &users))
    }

    pub fn to_ref(&self) -> TaskRef {
        TaskRef {
            id: self.id,
            task_no: self.task_no,
            title: self.title.clone(),
        }
    }

    /// Tasks matching every given filter, ordered by task number.
    ///
    /// `search_text` matches case-insensitively against title or description.
    /// A `project_id` that does not exist yields an empty list.
    pub async fn find_filtered<C: ConnectionTrait>(
        db: &C,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, DbErr> {
        let mut query = task::Entity::find();
        if let Some(project_id) = filter.project_id {
            let Some(project_row_id) = ids::project_id_by_uuid(db, project_id).await? else {
                return Ok(Vec::new());
            };
            query = query.filter(task::Column::ProjectId.eq(project_row_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(task::Column::Status.eq(status));
        }
        if let Some(priority) = filter.priority {
            query = query.filter(task::Column::Priority.eq(priority));
        }

        let models = query.order_by_asc(task::Column::TaskNo).all(db).await?;

        let needle = filter
            .search_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase);
        let models: Vec<task::Model> = match needle {
            Some(needle) => models
                .into_iter()
                .filter(|model| {
                    model.title.to_lowercase().contains(&needle)
                        || model.description.to_lowercase().contains(&needle)
                })
                .collect(),
            None => models,
        };

        if models.is_empty() {
            return Ok(Vec::new());
        }

        let projects = Project::ref_map(db).await?;
        let users = User::ref_map(db).await?;
        Ok(models
            .into_iter()
            .map(|model| Self::from_model_with(model, &projects, &users))
            .collect())
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        Self::find_filtered(db, &TaskFilter::default()).await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?;

        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    /// Identity of every still-existing task among `ids`.
    pub async fn find_refs<C: ConnectionTrait>(
        db: &C,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, TaskRef>, DbErr> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let records = task::Entity::find()
            .filter(task::Column::Uuid.is_in(ids.iter().copied()))
            .all(db)
            .await?;
        Ok(records
            .into_iter()
            .map(|model| {
                (
                    model.uuid,
                    TaskRef {
                        id: model.uuid,
                        task_no: model.task_no,
                        title: model.title,
                    },
                )
            })
            .collect())
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &TaskFields,
        task_no: i64,
        created_by: Uuid,
        task_id: Uuid,
    ) -> Result<Self, DbErr> {
        let project_row_id = resolve_project(db, data.project_id).await?;
        let assignee_row_id = resolve_user(db, data.assigned_to_id).await?;
        let created_by_row_id = ids::require_user_id(db, created_by).await?;

        let now = Utc::now();
        let active = task::ActiveModel {
            uuid: Set(task_id),
            task_no: Set(task_no),
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            status: Set(data.status),
            priority: Set(data.priority),
            project_id: Set(project_row_id),
            assigned_to_id: Set(assignee_row_id),
            due_date: Set(data.due_date),
            estimated_hours: Set(data.estimated_hours),
            actual_hours: Set(data.actual_hours),
            created_by_id: Set(created_by_row_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        Self::from_model(db, model).await
    }

    /// Overwrite every mutable field. `task_no` and `created_by` are kept.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &TaskFields,
    ) -> Result<Self, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound(TASK_NOT_FOUND.to_string()))?;

        let project_row_id = resolve_project(db, data.project_id).await?;
        let assignee_row_id = resolve_user(db, data.assigned_to_id).await?;

        let mut active: task::ActiveModel = record.into();
        active.title = Set(data.title.clone());
        active.description = Set(data.description.clone());
        active.status = Set(data.status);
        active.priority = Set(data.priority);
        active.project_id = Set(project_row_id);
        active.assigned_to_id = Set(assignee_row_id);
        active.due_date = Set(data.due_date);
        active.estimated_hours = Set(data.estimated_hours);
        active.actual_hours = Set(data.actual_hours);
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        Self::from_model(db, updated).await
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = task::Entity::delete_many()
            .filter(task::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

async fn resolve_project<C: ConnectionTrait>(
    db: &C,
    project_id: Option<Uuid>,
) -> Result<Option<i64>, DbErr> {
    match project_id {
        Some(id) => ids::project_id_by_uuid(db, id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))
            .map(Some),
        None => Ok(None),
    }
}

async fn resolve_user<C: ConnectionTrait>(
    db: &C,
    user_id: Option<Uuid>,
) -> Result<Option<i64>, DbErr> {
    match user_id {
        Some(id) => ids::require_user_id(db, id).await.map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::project::CreateProject;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn fields(title: &str) -> TaskFields {
        TaskFields {
            title: title.to_string(),
            description: String::new(),
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            project_id: None,
            assigned_to_id: None,
            due_date: None,
            estimated_hours: 0.0,
            actual_hours: 0.0,
        }
    }

    async fn create_project(db: &sea_orm::DatabaseConnection, no: i64) -> Project {
        Project::create(
            db,
            &CreateProject {
                name: format!("Project {no}"),
                description: None,
            },
            no,
            Uuid::new_v4(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn create_resolves_references() {
        let db = setup_db().await;
        let admin = User::create(&db, "admin", "h").await.unwrap();
        let worker = User::create(&db, "user1", "h").await.unwrap();
        let project = create_project(&db, 1).await;

        let mut data = fields("Write docs");
        data.project_id = Some(project.id);
        data.assigned_to_id = Some(worker.id);
        data.due_date = NaiveDate::from_ymd_opt(2024, 3, 1);
        data.estimated_hours = 4.5;

        let task = Task::create(&db, &data, 1, admin.id, Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(task.task_no, 1);
        assert_eq!(task.project, Some(project.to_ref()));
        assert_eq!(task.assigned_to, Some(worker.to_ref()));
        assert_eq!(task.created_by, Some(admin.to_ref()));
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.estimated_hours, 4.5);

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["taskNo"], 1);
        assert_eq!(json["dueDate"], "2024-03-01");
        assert_eq!(json["status"], "Pendiente");
    }

    #[tokio::test]
    async fn create_with_unknown_project_fails() {
        let db = setup_db().await;
        let admin = User::create(&db, "admin", "h").await.unwrap();
        let mut data = fields("Orphan");
        data.project_id = Some(Uuid::new_v4());

        let result = Task::create(&db, &data, 1, admin.id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(DbErr::RecordNotFound(_))));
    }

    #[tokio::test]
    async fn filters_combine_and_order_by_task_no() {
        let db = setup_db().await;
        let admin = User::create(&db, "admin", "h").await.unwrap();
        let project = create_project(&db, 1).await;

        let mut a = fields("Fix login bug");
        a.project_id = Some(project.id);
        a.priority = TaskPriority::High;
        let mut b = fields("Write report");
        b.description = "Quarterly LOGIN statistics".to_string();
        b.status = TaskStatus::Completed;
        let mut c = fields("Deploy");
        c.project_id = Some(project.id);
        c.priority = TaskPriority::High;

        Task::create(&db, &c, 3, admin.id, Uuid::new_v4()).await.unwrap();
        Task::create(&db, &a, 1, admin.id, Uuid::new_v4()).await.unwrap();
        Task::create(&db, &b, 2, admin.id, Uuid::new_v4()).await.unwrap();

        let all: Vec<i64> = Task::find_all(&db)
            .await
            .unwrap()
            .iter()
            .map(|t| t.task_no)
            .collect();
        assert_eq!(all, vec![1, 2, 3]);

        let search = TaskFilter {
            search_text: Some("login".to_string()),
            ..Default::default()
        };
        let found: Vec<i64> = Task::find_filtered(&db, &search)
            .await
            .unwrap()
            .iter()
            .map(|t| t.task_no)
            .collect();
        assert_eq!(found, vec![1, 2]);

        let combined = TaskFilter {
            priority: Some(TaskPriority::High),
            project_id: Some(project.id),
            search_text: Some("DEPLOY".to_string()),
            ..Default::default()
        };
        let found = Task::find_filtered(&db, &combined).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].task_no, 3);

        let completed = TaskFilter {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        assert_eq!(Task::find_filtered(&db, &completed).await.unwrap().len(), 1);

        let unknown_project = TaskFilter {
            project_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(
            Task::find_filtered(&db, &unknown_project)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn deleted_project_renders_as_none() {
        let db = setup_db().await;
        let admin = User::create(&db, "admin", "h").await.unwrap();
        let project = create_project(&db, 1).await;
        let mut data = fields("Linked");
        data.project_id = Some(project.id);
        let task = Task::create(&db, &data, 1, admin.id, Uuid::new_v4())
            .await
            .unwrap();

        Project::delete(&db, project.id).await.unwrap();

        let reloaded = Task::find_by_id(&db, task.id).await.unwrap().unwrap();
        assert_eq!(reloaded.project, None);
        let listed = Task::find_all(&db).await.unwrap();
        assert_eq!(listed[0].project, None);
    }

    #[tokio::test]
    async fn update_overwrites_fields_and_keeps_number() {
        let db = setup_db().await;
        let admin = User::create(&db, "admin", "h").await.unwrap();
        let id = Uuid::new_v4();
        let mut data = fields("Original");
        data.actual_hours = 2.0;
        Task::create(&db, &data, 5, admin.id, id).await.unwrap();

        let mut next = fields("Renamed");
        next.status = TaskStatus::InProgress;
        next.assigned_to_id = Some(admin.id);
        next.actual_hours = 3.0;
        let updated = Task::update(&db, id, &next).await.unwrap();

        assert_eq!(updated.task_no, 5);
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.assigned_to, Some(admin.to_ref()));
        assert_eq!(updated.actual_hours, 3.0);
        assert_eq!(updated.created_by, Some(admin.to_ref()));

        let missing = Task::update(&db, Uuid::new_v4(), &next).await;
        assert!(matches!(missing, Err(DbErr::RecordNotFound(_))));
    }

    #[tokio::test]
    async fn find_refs_skips_deleted_tasks() {
        let db = setup_db().await;
        let admin = User::create(&db, "admin", "h").await.unwrap();
        let kept = Task::create(&db, &fields("Kept"), 1, admin.id, Uuid::new_v4())
            .await
            .unwrap();
        let gone = Task::create(&db, &fields("Gone"), 2, admin.id, Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(Task::delete(&db, gone.id).await.unwrap(), 1);

        let refs = Task::find_refs(&db, &[kept.id, gone.id]).await.unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[&kept.id], kept.to_ref());
    }
}
