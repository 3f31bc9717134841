use axum::{
    Router,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use deployment::Deployment;
use services::services::export::TASKS_CSV_FILENAME;

use crate::{DeploymentImpl, error::ApiError};

pub async fn export_tasks_csv(
    State(deployment): State<DeploymentImpl>,
) -> Result<Response, ApiError> {
    let csv = deployment.export().tasks_csv(&deployment.db().pool).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{TASKS_CSV_FILENAME}\""),
            ),
        ],
        csv,
    )
        .into_response())
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/export/tasks.csv", get(export_tasks_csv))
}
