use db::{
    DbErr, DbPool,
    models::{
        counter::{self, PROJECT_SEQUENCE},
        project::{CreateProject, Project, UpdateProject},
    },
};
use serde::Deserialize;
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProjectServiceError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Project not found")]
    ProjectNotFound,
}

pub type Result<T> = std::result::Result<T, ProjectServiceError>;

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct ProjectPayload {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ProjectPayload {
    fn validated(&self) -> Result<CreateProject> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ProjectServiceError::Validation("Name is required".to_string()))?;
        Ok(CreateProject {
            name: name.to_string(),
            description: self.description.clone(),
        })
    }
}

#[derive(Clone, Default)]
pub struct ProjectService;

impl ProjectService {
    pub fn new() -> Self {
        Self
    }

    pub async fn list(&self, pool: &DbPool) -> Result<Vec<Project>> {
        Ok(Project::find_all(pool).await?)
    }

    /// Reserves a project number once the payload is known to be valid.
    pub async fn create_project(&self, pool: &DbPool, payload: &ProjectPayload) -> Result<Project> {
        let data = payload.validated()?;
        let project_no = counter::next_value(pool, PROJECT_SEQUENCE).await?;
        let project = Project::create(pool, &data, project_no, Uuid::new_v4()).await?;
        tracing::debug!(project_id = %project.id, project_no, "Project created");
        Ok(project)
    }

    pub async fn update_project(
        &self,
        pool: &DbPool,
        existing: &Project,
        payload: &ProjectPayload,
    ) -> Result<Project> {
        let data: UpdateProject = payload.validated()?;
        Project::update(pool, existing.id, &data)
            .await
            .map_err(|err| match err {
                DbErr::RecordNotFound(_) => ProjectServiceError::ProjectNotFound,
                other => ProjectServiceError::Database(other),
            })
    }

    /// Tasks that referenced the project keep a dangling reference.
    pub async fn delete_project(&self, pool: &DbPool, project_id: Uuid) -> Result<()> {
        let rows_affected = Project::delete(pool, project_id).await?;
        if rows_affected == 0 {
            return Err(ProjectServiceError::ProjectNotFound);
        }
        tracing::debug!(%project_id, "Project deleted");
        Ok(())
    }
}
