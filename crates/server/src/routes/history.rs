use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::history::HistoryWithTask;
use deployment::Deployment;
use serde::Deserialize;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<String>,
}

impl HistoryQuery {
    /// Anything that is not a non-negative integer falls back to the default.
    fn limit(&self) -> Option<u64> {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
    }
}

pub async fn get_history(
    State(deployment): State<DeploymentImpl>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<ResponseJson<ApiResponse<Vec<HistoryWithTask>>>, ApiError> {
    let Query(query) = query?;
    let history = deployment
        .tasks()
        .recent_history(&deployment.db().pool, query.limit())
        .await?;
    Ok(ResponseJson(ApiResponse::success(history)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/history", get(get_history))
}
