use axum::{
    Extension, Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{comment::Comment, history::HistoryEntry, task::Task};
use deployment::Deployment;
use services::services::task::{CreateComment, TaskPayload, TaskQuery};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl, error::ApiError, http::CurrentUser, middleware::load_task_middleware,
};

pub async fn get_tasks(
    State(deployment): State<DeploymentImpl>,
    query: Result<Query<TaskQuery>, QueryRejection>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let Query(query) = query?;
    let tasks = deployment.tasks().list(&deployment.db().pool, &query).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn create_task(
    State(deployment): State<DeploymentImpl>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Task>>), ApiError> {
    let Json(payload) = payload?;
    tracing::debug!(
        user = %user.username,
        title = ?payload.title,
        "Creating task"
    );

    let task = deployment
        .tasks()
        .create(&deployment.db().pool, user.id, &payload)
        .await?;

    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(task))))
}

pub async fn update_task(
    Extension(existing_task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let Json(payload) = payload?;
    tracing::debug!(task_id = %existing_task.id, user = %user.username, "Updating task");

    let task = deployment
        .tasks()
        .update(&deployment.db().pool, user.id, &existing_task, &payload)
        .await?;

    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    tracing::debug!(task_id = %task.id, user = %user.username, "Deleting task");
    deployment
        .tasks()
        .delete(&deployment.db().pool, user.id, &task)
        .await?;

    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Task deleted",
    )))
}

pub async fn get_comments(
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Comment>>>, ApiError> {
    let comments = deployment
        .tasks()
        .comments(&deployment.db().pool, &task)
        .await?;
    Ok(ResponseJson(ApiResponse::success(comments)))
}

pub async fn create_comment(
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<CreateComment>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Comment>>), ApiError> {
    let Json(payload) = payload?;
    let comment = deployment
        .tasks()
        .add_comment(&deployment.db().pool, user.id, &task, &payload)
        .await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(comment))))
}

/// Served without the task loader so deleted tasks keep their audit trail.
pub async fn get_task_history(
    State(deployment): State<DeploymentImpl>,
    Path(task_id): Path<String>,
) -> Result<ResponseJson<ApiResponse<Vec<HistoryEntry>>>, ApiError> {
    let Ok(task_id) = Uuid::parse_str(task_id.trim()) else {
        return Ok(ResponseJson(ApiResponse::success(Vec::new())));
    };
    let history = deployment
        .tasks()
        .history(&deployment.db().pool, task_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(history)))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let task_id_router = Router::new()
        .route("/", get(get_task).put(update_task).delete(delete_task))
        .route("/comments", get(get_comments).post(create_comment))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_task_middleware::<DeploymentImpl>,
        ));

    let inner = Router::new()
        .route("/", get(get_tasks).post(create_task))
        .route("/{task_id}/history", get(get_task_history))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/tasks", inner)
}
