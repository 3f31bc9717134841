use std::{fmt::Display, future::Future};

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use db::{
    DBService,
    models::{project::Project, task::Task},
};
use deployment::Deployment;
use uuid::Uuid;

use crate::error::ApiError;

pub trait ModelLoaderDeps {
    fn db_service(&self) -> &DBService;
}

impl<D> ModelLoaderDeps for D
where
    D: Deployment,
{
    fn db_service(&self) -> &DBService {
        self.db()
    }
}

async fn fetch_model_or_error<M, E, Fut>(
    model_name: &'static str,
    model_id: Uuid,
    load_future: Fut,
) -> Result<M, ApiError>
where
    E: Display,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    match load_future.await {
        Ok(Some(model)) => Ok(model),
        Ok(None) => {
            tracing::warn!("{model_name} {model_id} not found");
            Err(ApiError::NotFound(format!("{model_name} not found")))
        }
        Err(error) => {
            tracing::error!("Failed to fetch {model_name} {model_id}: {error}");
            Err(ApiError::Internal(format!("Failed to fetch {model_name}")))
        }
    }
}

async fn load_request_extension<M, E, Fut>(
    request: Request,
    next: Next,
    model_name: &'static str,
    model_id: Uuid,
    load_future: Fut,
) -> Response
where
    M: Clone + Send + Sync + 'static,
    E: Display,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    match fetch_model_or_error(model_name, model_id, load_future).await {
        Ok(model) => {
            let mut request = request;
            request.extensions_mut().insert(model);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Path ids that are not uuids never match a row.
fn parse_model_id(model_name: &'static str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::NotFound(format!("{model_name} not found")))
}

pub async fn load_project_middleware<S>(
    State(deployment): State<S>,
    Path(project_id): Path<String>,
    request: Request,
    next: Next,
) -> Response
where
    S: ModelLoaderDeps,
{
    let project_id = match parse_model_id("Project", &project_id) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    load_request_extension(
        request,
        next,
        "Project",
        project_id,
        Project::find_by_id(&deployment.db_service().pool, project_id),
    )
    .await
}

pub async fn load_task_middleware<S>(
    State(deployment): State<S>,
    Path(task_id): Path<String>,
    request: Request,
    next: Next,
) -> Response
where
    S: ModelLoaderDeps,
{
    let task_id = match parse_model_id("Task", &task_id) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    load_request_extension(
        request,
        next,
        "Task",
        task_id,
        Task::find_by_id(&deployment.db_service().pool, task_id),
    )
    .await
}
