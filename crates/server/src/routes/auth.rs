use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::Json as ResponseJson,
    routing::post,
};
use deployment::Deployment;
use services::services::auth::{LoginRequest, LoginResponse};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

pub async fn login(
    State(deployment): State<DeploymentImpl>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<LoginResponse>>, ApiError> {
    let Json(payload) = payload?;
    let response = deployment
        .auth()
        .login(&deployment.db().pool, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(response)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/auth/login", post(login))
}
