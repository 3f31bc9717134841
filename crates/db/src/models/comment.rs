use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    ids,
    user::{User, UserRef},
};
use crate::entities::comment;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub comment_text: String,
    pub user: Option<UserRef>,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
}

impl Comment {
    fn from_model(model: comment::Model, user: Option<UserRef>) -> Self {
        Self {
            id: model.uuid,
            comment_text: model.comment_text,
            user,
            created_at: model.created_at,
        }
    }

    /// Comments on a task, oldest first.
    pub async fn find_by_task_id<C: ConnectionTrait>(
        db: &C,
        task_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let Some(task_row_id) = ids::task_id_by_uuid(db, task_id).await? else {
            return Ok(Vec::new());
        };
        let records = comment::Entity::find()
            .filter(comment::Column::TaskId.eq(task_row_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
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

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        task_id: Uuid,
        user_id: Uuid,
        comment_text: &str,
    ) -> Result<Self, DbErr> {
        let task_row_id = ids::require_task_id(db, task_id).await?;
        let user_row_id = ids::require_user_id(db, user_id).await?;

        let active = comment::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            task_id: Set(task_row_id),
            user_id: Set(user_row_id),
            comment_text: Set(comment_text.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        let user = User::ref_by_row_id(db, user_row_id).await?;
        Ok(Self::from_model(model, user))
    }

    pub async fn delete_by_task_id<C: ConnectionTrait>(
        db: &C,
        task_id: Uuid,
    ) -> Result<u64, DbErr> {
        let Some(task_row_id) = ids::task_id_by_uuid(db, task_id).await? else {
            return Ok(0);
        };
        let result = comment::Entity::delete_many()
            .filter(comment::Column::TaskId.eq(task_row_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
