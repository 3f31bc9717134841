use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect, Set,
    sea_query::{Expr, ExprTrait, OnConflict},
};

use crate::entities::counter;

pub const TASK_SEQUENCE: &str = "task";
pub const PROJECT_SEQUENCE: &str = "project";

/// Atomically reserve the next value of a named sequence.
///
/// The first call for a name yields 1. The increment is a single
/// upsert statement, so concurrent callers never observe the same value.
pub async fn next_value<C: ConnectionTrait>(db: &C, name: &str) -> Result<i64, DbErr> {
    let active = counter::ActiveModel {
        name: Set(name.to_string()),
        seq: Set(1),
        ..Default::default()
    };

    let model = counter::Entity::insert(active)
        .on_conflict(
            OnConflict::column(counter::Column::Name)
                .value(
                    counter::Column::Seq,
                    Expr::col((counter::Entity, counter::Column::Seq)).add(1),
                )
                .to_owned(),
        )
        .exec_with_returning(db)
        .await?;

    Ok(model.seq)
}

pub async fn current_value<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<i64>, DbErr> {
    counter::Entity::find()
        .select_only()
        .column(counter::Column::Seq)
        .filter(counter::Column::Name.eq(name))
        .into_tuple()
        .one(db)
        .await
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;
    use tokio::task::JoinSet;

    use super::*;
    use crate::DBService;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn sequence_starts_at_one_and_increments() {
        let db = setup_db().await;

        assert_eq!(current_value(&db, TASK_SEQUENCE).await.unwrap(), None);
        assert_eq!(next_value(&db, TASK_SEQUENCE).await.unwrap(), 1);
        assert_eq!(next_value(&db, TASK_SEQUENCE).await.unwrap(), 2);
        assert_eq!(next_value(&db, TASK_SEQUENCE).await.unwrap(), 3);
        assert_eq!(current_value(&db, TASK_SEQUENCE).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn sequences_are_independent_per_name() {
        let db = setup_db().await;

        assert_eq!(next_value(&db, TASK_SEQUENCE).await.unwrap(), 1);
        assert_eq!(next_value(&db, TASK_SEQUENCE).await.unwrap(), 2);
        assert_eq!(next_value(&db, PROJECT_SEQUENCE).await.unwrap(), 1);
        assert_eq!(next_value(&db, TASK_SEQUENCE).await.unwrap(), 3);
        assert_eq!(next_value(&db, PROJECT_SEQUENCE).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn concurrent_callers_receive_distinct_contiguous_values() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("sequence.sqlite").to_string_lossy()
        );
        let service = DBService::connect(&url).await.unwrap();

        let start = next_value(&service.pool, TASK_SEQUENCE).await.unwrap();

        let callers = 24;
        let mut set = JoinSet::new();
        for _ in 0..callers {
            let pool = service.pool.clone();
            set.spawn(async move { next_value(&pool, TASK_SEQUENCE).await });
        }

        let mut values = BTreeSet::new();
        while let Some(joined) = set.join_next().await {
            let value = joined.unwrap().unwrap();
            assert!(values.insert(value), "duplicate sequence value {value}");
        }

        let expected: BTreeSet<i64> = (start + 1..=start + callers).collect();
        assert_eq!(values, expected);
    }
}
