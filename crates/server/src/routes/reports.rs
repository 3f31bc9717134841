use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use deployment::Deployment;
use services::services::report::{ProjectsReport, SummaryReport, TasksReport, UsersReport};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

pub async fn tasks_report(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<TasksReport>>, ApiError> {
    let report = deployment.reports().tasks(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub async fn projects_report(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<ProjectsReport>>, ApiError> {
    let report = deployment.reports().projects(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub async fn users_report(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<UsersReport>>, ApiError> {
    let report = deployment.reports().users(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub async fn summary_report(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<SummaryReport>>, ApiError> {
    let report = deployment.reports().summary(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub fn router() -> Router<DeploymentImpl> {
    let inner = Router::new()
        .route("/tasks", get(tasks_report))
        .route("/projects", get(projects_report))
        .route("/users", get(users_report))
        .route("/summary", get(summary_report));

    Router::new().nest("/reports", inner)
}
