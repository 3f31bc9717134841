use db::{DbErr, DbPool, models::notification::Notification};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

pub const NOTIFICATION_LIST_LIMIT: u64 = 200;

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct NotificationQuery {
    /// Absent or empty means `true`. Any value other than `true` lists read
    /// notifications too.
    pub unread: Option<String>,
}

impl NotificationQuery {
    pub fn unread_only(&self) -> bool {
        matches!(self.unread.as_deref(), None | Some("" | "true"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct MarkReadResponse {
    pub updated: u64,
}

#[derive(Clone, Default)]
pub struct NotificationService;

impl NotificationService {
    pub fn new() -> Self {
        Self
    }

    /// The user's inbox, newest first.
    pub async fn list(
        &self,
        pool: &DbPool,
        user_id: Uuid,
        query: &NotificationQuery,
    ) -> Result<Vec<Notification>, DbErr> {
        Notification::find_for_user(pool, user_id, query.unread_only(), NOTIFICATION_LIST_LIMIT)
            .await
    }

    pub async fn mark_all_read(
        &self,
        pool: &DbPool,
        user_id: Uuid,
    ) -> Result<MarkReadResponse, DbErr> {
        let updated = Notification::mark_all_read(pool, user_id).await?;
        tracing::debug!(%user_id, updated, "Notifications marked read");
        Ok(MarkReadResponse { updated })
    }
}

#[cfg(test)]
mod tests {
    use db::models::{notification::NotificationKind, user::User};

    use super::*;
    use crate::services::test_db::setup_db;

    #[test]
    fn unread_only_when_absent_or_true() {
        let query = |raw: Option<&str>| NotificationQuery {
            unread: raw.map(str::to_string),
        };
        assert!(query(None).unread_only());
        assert!(query(Some("true")).unread_only());
        assert!(query(Some("")).unread_only());
        assert!(!query(Some("false")).unread_only());
        assert!(!query(Some("yes")).unread_only());
        assert!(!query(Some("0")).unread_only());
    }

    #[tokio::test]
    async fn mark_read_twice_leaves_zero_unread() {
        let pool = setup_db().await;
        let user = User::create(&pool, "user1", "h").await.unwrap();
        for _ in 0..2 {
            Notification::create(&pool, user.id, "n", NotificationKind::TaskAssigned)
                .await
                .unwrap();
        }
        let service = NotificationService::new();

        assert_eq!(service.mark_all_read(&pool, user.id).await.unwrap().updated, 2);
        assert_eq!(Notification::count_unread(&pool, user.id).await.unwrap(), 0);
        assert_eq!(service.mark_all_read(&pool, user.id).await.unwrap().updated, 0);
        assert_eq!(Notification::count_unread(&pool, user.id).await.unwrap(), 0);

        let unread = service
            .list(&pool, user.id, &NotificationQuery::default())
            .await
            .unwrap();
        assert!(unread.is_empty());
        let all = service
            .list(
                &pool,
                user.id,
                &NotificationQuery {
                    unread: Some("false".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }
}
