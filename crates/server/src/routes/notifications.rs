use axum::{
    Extension, Router,
    extract::{Query, State, rejection::QueryRejection},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::notification::Notification;
use deployment::Deployment;
use services::services::notification::{MarkReadResponse, NotificationQuery};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, http::CurrentUser};

pub async fn get_notifications(
    State(deployment): State<DeploymentImpl>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    query: Result<Query<NotificationQuery>, QueryRejection>,
) -> Result<ResponseJson<ApiResponse<Vec<Notification>>>, ApiError> {
    let Query(query) = query?;
    let notifications = deployment
        .notifications()
        .list(&deployment.db().pool, user.id, &query)
        .await?;
    Ok(ResponseJson(ApiResponse::success(notifications)))
}

pub async fn mark_notifications_read(
    State(deployment): State<DeploymentImpl>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<ResponseJson<ApiResponse<MarkReadResponse>>, ApiError> {
    let response = deployment
        .notifications()
        .mark_all_read(&deployment.db().pool, user.id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(response)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/notifications", get(get_notifications))
        .route("/notifications/mark-read", post(mark_notifications_read))
}
