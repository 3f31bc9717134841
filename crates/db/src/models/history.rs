use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    ids,
    task::{Task, TaskRef},
    user::{User, UserRef},
};
pub use crate::types::HistoryAction;
use crate::entities::history;

/// One audit record. History survives deletion of the task it describes.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub action: HistoryAction,
    pub old_value: String,
    pub new_value: String,
    pub user: Option<UserRef>,
    #[ts(type = "Date")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct HistoryWithTask {
    #[serde(flatten)]
    #[ts(flatten)]
    pub entry: HistoryEntry,
    /// `None` once the task has been deleted.
    pub task: Option<TaskRef>,
}

impl std::ops::Deref for HistoryWithTask {
    type Target = HistoryEntry;
    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}

#[derive(Debug, Clone)]
pub struct CreateHistory {
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub action: HistoryAction,
    pub old_value: String,
    pub new_value: String,
}

impl HistoryEntry {
    fn from_model(model: history::Model, user: Option<UserRef>) -> Self {
        Self {
            id: model.uuid,
            task_id: model.task_uuid,
            action: model.action,
            old_value: model.old_value,
            new_value: model.new_value,
            user,
            timestamp: model.timestamp,
        }
    }

    pub async fn create<C: ConnectionTrait>(db: &C, data: &CreateHistory) -> Result<Self, DbErr> {
        let user_row_id = ids::require_user_id(db, data.user_id).await?;
        let active = history::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            task_uuid: Set(data.task_id),
            user_id: Set(user_row_id),
            action: Set(data.action),
            old_value: Set(data.old_value.clone()),
            new_value: Set(data.new_value.clone()),
            timestamp: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        let user = User::ref_by_row_id(db, user_row_id).await?;
        Ok(Self::from_model(model, user))
    }

    /// Entries for one task, oldest first.
    pub async fn find_by_task_id<C: ConnectionTrait>(
        db: &C,
        task_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let records = history::Entity::find()
            .filter(history::Column::TaskUuid.eq(task_id))
            .order_by_asc(history::Column::Timestamp)
            .order_by_asc(history::Column::Id)
            .all(db)
            .await?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let users = User::ref_map(db).await?;
        Ok(records
            .into_iter()
            .map(|model| {
                let user = users.get(&model.user_id).cloned();
                Self::from_model(model, user)
            })
            .collect())
    }

    /// Most recent entries across all tasks, newest first.
    pub async fn find_recent<C: ConnectionTrait>(
        db: &C,
        limit: u64,
    ) -> Result<Vec<HistoryWithTask>, DbErr> {
        let records = history::Entity::find()
            .order_by_desc(history::Column::Timestamp)
            .order_by_desc(history::Column::Id)
            .limit(limit)
            .all(db)
            .await?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let task_ids: Vec<Uuid> = records.iter().map(|model| model.task_uuid).collect();
        let tasks = Task::find_refs(db, &task_ids).await?;
        let users = User::ref_map(db).await?;
        Ok(records
            .into_iter()
            .map(|model| {
                let task = tasks.get(&model.task_uuid).cloned();
                let user = users.get(&model.user_id).cloned();
                HistoryWithTask {
                    entry: Self::from_model(model, user),
                    task,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::task::{TaskFields, TaskPriority, TaskStatus};

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn entry(
        task_id: Uuid,
        user_id: Uuid,
        action: HistoryAction,
        new_value: &str,
    ) -> CreateHistory {
        CreateHistory {
            task_id,
            user_id,
            action,
            old_value: String::new(),
            new_value: new_value.to_string(),
        }
    }

    #[tokio::test]
    async fn task_history_is_chronological() {
        let db = setup_db().await;
        let admin = User::create(&db, "admin", "h").await.unwrap();
        let task_id = Uuid::new_v4();

        HistoryEntry::create(&db, &entry(task_id, admin.id, HistoryAction::Created, "A"))
            .await
            .unwrap();
        HistoryEntry::create(
            &db,
            &entry(task_id, admin.id, HistoryAction::TitleChanged, "B"),
        )
        .await
        .unwrap();
        HistoryEntry::create(
            &db,
            &entry(Uuid::new_v4(), admin.id, HistoryAction::Created, "other"),
        )
        .await
        .unwrap();

        let entries = HistoryEntry::find_by_task_id(&db, task_id).await.unwrap();
        let actions: Vec<HistoryAction> = entries.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![HistoryAction::Created, HistoryAction::TitleChanged]
        );
        assert_eq!(entries[0].user, Some(admin.to_ref()));
    }

    #[tokio::test]
    async fn recent_history_is_newest_first_and_limited() {
        let db = setup_db().await;
        let admin = User::create(&db, "admin", "h").await.unwrap();
        let fields = TaskFields {
            title: "Tracked".to_string(),
            description: String::new(),
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            project_id: None,
            assigned_to_id: None,
            due_date: None,
            estimated_hours: 0.0,
            actual_hours: 0.0,
        };
        let task = Task::create(&db, &fields, 1, admin.id, Uuid::new_v4())
            .await
            .unwrap();
        let deleted_task = Uuid::new_v4();

        for value in ["1", "2", "3"] {
            HistoryEntry::create(&db, &entry(task.id, admin.id, HistoryAction::Created, value))
                .await
                .unwrap();
        }
        HistoryEntry::create(
            &db,
            &entry(deleted_task, admin.id, HistoryAction::Deleted, ""),
        )
        .await
        .unwrap();

        let recent = HistoryEntry::find_recent(&db, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].action, HistoryAction::Deleted);
        assert_eq!(recent[0].task, None);
        assert_eq!(recent[1].new_value, "3");
        assert_eq!(recent[1].task, Some(task.to_ref()));
    }
}
