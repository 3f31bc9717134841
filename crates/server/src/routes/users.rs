use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::user::{User, UserRef};
use deployment::Deployment;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

/// Usernames only. Credentials never leave the users table.
pub async fn get_users(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<UserRef>>>, ApiError> {
    let users = User::find_all(&deployment.db().pool)
        .await?
        .iter()
        .map(User::to_ref)
        .collect();
    Ok(ResponseJson(ApiResponse::success(users)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/users", get(get_users))
}
