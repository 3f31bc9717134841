use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::ids;
pub use crate::types::NotificationKind;
use crate::entities::notification;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub read: bool,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    fn from_model(model: notification::Model) -> Self {
        Self {
            id: model.uuid,
            message: model.message,
            kind: model.kind,
            read: model.read,
            created_at: model.created_at,
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        message: &str,
        kind: NotificationKind,
    ) -> Result<Self, DbErr> {
        let user_row_id = ids::require_user_id(db, user_id).await?;
        let active = notification::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_row_id),
            message: Set(message.to_string()),
            kind: Set(kind),
            read: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    /// A user's notifications, newest first.
    pub async fn find_for_user<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        unread_only: bool,
        limit: u64,
    ) -> Result<Vec<Self>, DbErr> {
        let Some(user_row_id) = ids::user_id_by_uuid(db, user_id).await? else {
            return Ok(Vec::new());
        };
        let mut query =
            notification::Entity::find().filter(notification::Column::UserId.eq(user_row_id));
        if unread_only {
            query = query.filter(notification::Column::Read.eq(false));
        }
        let records = query
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .limit(limit)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn count_unread<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, DbErr> {
        let Some(user_row_id) = ids::user_id_by_uuid(db, user_id).await? else {
            return Ok(0);
        };
        notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_row_id))
            .filter(notification::Column::Read.eq(false))
            .count(db)
            .await
    }

    /// Returns how many notifications flipped from unread to read.
    pub async fn mark_all_read<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, DbErr> {
        let Some(user_row_id) = ids::user_id_by_uuid(db, user_id).await? else {
            return Ok(0);
        };
        let result = notification::Entity::update_many()
            .col_expr(notification::Column::Read, Expr::value(true))
            .filter(notification::Column::UserId.eq(user_row_id))
            .filter(notification::Column::Read.eq(false))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
