use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::entities::user;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
}

/// Compact view of a user embedded in other records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct UserRef {
    pub id: Uuid,
    pub username: String,
}

/// Stored credentials. Never serialized.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

impl User {
    fn from_model(model: user::Model) -> Self {
        Self {
            id: model.uuid,
            username: model.username,
            created_at: model.created_at,
        }
    }

    pub fn to_ref(&self) -> UserRef {
        UserRef {
            id: self.id,
            username: self.username.clone(),
        }
    }

    pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
        user::Entity::find().count(db).await
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = user::Entity::find()
            .order_by_asc(user::Column::Username)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    /// All users keyed by their row id, ordered by username.
    pub async fn find_all_keyed<C: ConnectionTrait>(db: &C) -> Result<Vec<(i64, UserRef)>, DbErr> {
        let records = user::Entity::find()
            .order_by_asc(user::Column::Username)
            .all(db)
            .await?;
        Ok(records
            .into_iter()
            .map(|model| {
                (
                    model.id,
                    UserRef {
                        id: model.uuid,
                        username: model.username,
                    },
                )
            })
            .collect())
    }

    pub(crate) async fn ref_map<C: ConnectionTrait>(
        db: &C,
    ) -> Result<HashMap<i64, UserRef>, DbErr> {
        Ok(Self::find_all_keyed(db).await?.into_iter().collect())
    }

    pub(crate) async fn ref_by_row_id<C: ConnectionTrait>(
        db: &C,
        id: i64,
    ) -> Result<Option<UserRef>, DbErr> {
        let record = user::Entity::find_by_id(id).one(db).await?;
        Ok(record.map(|model| UserRef {
            id: model.uuid,
            username: model.username,
        }))
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_credentials_by_username<C: ConnectionTrait>(
        db: &C,
        username: &str,
    ) -> Result<Option<UserCredentials>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(db)
            .await?;
        Ok(record.map(|model| {
            let password_hash = model.password_hash.clone();
            UserCredentials {
                user: Self::from_model(model),
                password_hash,
            }
        }))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        username: &str,
        password_hash: &str,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = user::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn users_are_listed_by_username() {
        let db = setup_db().await;
        User::create(&db, "user2", "h2").await.unwrap();
        User::create(&db, "admin", "h0").await.unwrap();
        User::create(&db, "user1", "h1").await.unwrap();

        let names: Vec<String> = User::find_all(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["admin", "user1", "user2"]);
        assert_eq!(User::count(&db).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let db = setup_db().await;
        User::create(&db, "admin", "h").await.unwrap();
        assert!(User::create(&db, "admin", "other").await.is_err());
    }

    #[tokio::test]
    async fn credentials_lookup_returns_hash() {
        let db = setup_db().await;
        let created = User::create(&db, "admin", "$argon2id$fake").await.unwrap();

        let creds = User::find_credentials_by_username(&db, "admin")
            .await
            .unwrap()
            .expect("credentials");
        assert_eq!(creds.user.id, created.id);
        assert_eq!(creds.password_hash, "$argon2id$fake");

        assert!(
            User::find_credentials_by_username(&db, "nobody")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn serialized_user_has_no_password_field() {
        let user = User {
            id: Uuid::nil(),
            username: "admin".to_string(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["username"], "admin");
    }
}
