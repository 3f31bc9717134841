use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::entities::project;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub project_no: i64,
    pub name: String,
    pub description: String,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub id: Uuid,
    pub project_no: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
}

pub type UpdateProject = CreateProject;

impl Project {
    fn from_model(model: project::Model) -> Self {
        Self {
            id: model.uuid,
            project_no: model.project_no,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub fn to_ref(&self) -> ProjectRef {
        ProjectRef {
            id: self.id,
            project_no: self.project_no,
            name: self.name.clone(),
        }
    }

    pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
        project::Entity::find().count(db).await
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = project::Entity::find()
            .order_by_asc(project::Column::ProjectNo)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    /// All projects keyed by their row id, ordered by project number.
    pub async fn find_all_keyed<C: ConnectionTrait>(db: &C) -> Result<Vec<(i64, Self)>, DbErr> {
        let records = project::Entity::find()
            .order_by_asc(project::Column::ProjectNo)
            .all(db)
            .await?;
        Ok(records
            .into_iter()
            .map(|model| (model.id, Self::from_model(model)))
            .collect())
    }

    pub(crate) async fn ref_map<C: ConnectionTrait>(
        db: &C,
    ) -> Result<HashMap<i64, ProjectRef>, DbErr> {
        Ok(Self::find_all_keyed(db)
            .await?
            .into_iter()
            .map(|(id, project)| (id, project.to_ref()))
            .collect())
    }

    pub(crate) async fn ref_by_row_id<C: ConnectionTrait>(
        db: &C,
        id: i64,
    ) -> Result<Option<ProjectRef>, DbErr> {
        let record = project::Entity::find_by_id(id).one(db).await?;
        Ok(record.map(|model| Self::from_model(model).to_ref()))
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = project::Entity::find()
            .filter(project::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateProject,
        project_no: i64,
        project_id: Uuid,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = project::ActiveModel {
            uuid: Set(project_id),
            project_no: Set(project_no),
            name: Set(data.name.clone()),
            description: Set(data.description.clone().unwrap_or_default()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    /// Replace name and description. `project_no` never changes.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        payload: &UpdateProject,
    ) -> Result<Self, DbErr> {
        let record = project::Entity::find()
            .filter(project::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        let mut active: project::ActiveModel = record.into();
        active.name = Set(payload.name.clone());
        active.description = Set(payload.description.clone().unwrap_or_default());
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    /// Deletes only the project row; tasks referencing it keep a dangling
    /// reference that renders as no project.
    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = project::Entity::delete_many()
            .filter(project::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
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

    fn payload(name: &str) -> CreateProject {
        CreateProject {
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn projects_are_ordered_by_number() {
        let db = setup_db().await;
        Project::create(&db, &payload("second"), 2, Uuid::new_v4())
            .await
            .unwrap();
        Project::create(&db, &payload("first"), 1, Uuid::new_v4())
            .await
            .unwrap();

        let names: Vec<String> = Project::find_all(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn update_keeps_project_number() {
        let db = setup_db().await;
        let id = Uuid::new_v4();
        let created = Project::create(&db, &payload("before"), 7, id).await.unwrap();
        assert_eq!(created.description, "");

        let updated = Project::update(
            &db,
            id,
            &UpdateProject {
                name: "after".to_string(),
                description: Some("details".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.project_no, 7);
        assert_eq!(updated.name, "after");
        assert_eq!(updated.description, "details");

        let missing = Project::update(&db, Uuid::new_v4(), &payload("x")).await;
        assert!(matches!(missing, Err(DbErr::RecordNotFound(_))));
    }

    #[tokio::test]
    async fn delete_reports_rows_affected() {
        let db = setup_db().await;
        let id = Uuid::new_v4();
        Project::create(&db, &payload("gone"), 1, id).await.unwrap();

        assert_eq!(Project::delete(&db, id).await.unwrap(), 1);
        assert_eq!(Project::delete(&db, id).await.unwrap(), 0);
        assert!(Project::find_by_id(&db, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn project_numbers_are_unique() {
        let db = setup_db().await;
        Project::create(&db, &payload("a"), 1, Uuid::new_v4())
            .await
            .unwrap();
        assert!(
            Project::create(&db, &payload("b"), 1, Uuid::new_v4())
                .await
                .is_err()
        );
    }
}
