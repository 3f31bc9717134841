use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::project::Project;
use deployment::Deployment;
use services::services::project::ProjectPayload;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, middleware::load_project_middleware};

pub async fn get_projects(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Project>>>, ApiError> {
    let projects = deployment.projects().list(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(projects)))
}

pub async fn get_project(
    Extension(project): Extension<Project>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn create_project(
    State(deployment): State<DeploymentImpl>,
    payload: Result<Json<ProjectPayload>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Project>>), ApiError> {
    let Json(payload) = payload?;
    tracing::debug!(name = ?payload.name, "Creating project");

    let project = deployment
        .projects()
        .create_project(&deployment.db().pool, &payload)
        .await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(project))))
}

pub async fn update_project(
    Extension(existing_project): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
    payload: Result<Json<ProjectPayload>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let Json(payload) = payload?;
    let project = deployment
        .projects()
        .update_project(&deployment.db().pool, &existing_project, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn delete_project(
    Extension(project): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    deployment
        .projects()
        .delete_project(&deployment.db().pool, project.id)
        .await?;
    tracing::info!(project_id = %project.id, project_no = project.project_no, "Project deleted");
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Project deleted",
    )))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let project_id_router = Router::new()
        .route(
            "/",
            get(get_project).put(update_project).delete(delete_project),
        )
        .layer(from_fn_with_state(
            deployment.clone(),
            load_project_middleware::<DeploymentImpl>,
        ));

    let inner = Router::new()
        .route("/", get(get_projects).post(create_project))
        .nest("/{project_id}", project_id_router);

    Router::new().nest("/projects", inner)
}
