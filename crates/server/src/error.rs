use std::sync::OnceLock;

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::DbErr;
use deployment::DeploymentError;
use serde::Serialize;
use services::services::{
    auth::AuthError, project::ProjectServiceError, task::TaskServiceError,
};
use thiserror::Error;
use ts_rs::TS;
use utils::response::ApiResponse;

static EXPOSE_ERROR_DETAIL: OnceLock<bool> = OnceLock::new();

/// Decides once per process whether error bodies carry the error chain.
/// Only the first call has an effect.
pub fn expose_error_detail(enabled: bool) {
    let _ = EXPOSE_ERROR_DETAIL.set(enabled);
}

fn error_detail_exposed() -> bool {
    EXPOSE_ERROR_DETAIL.get().copied().unwrap_or(true)
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub error_type: &'static str,
    pub detail: Vec<String>,
}

#[derive(Debug, Error, TS)]
#[ts(type = "string")]
pub enum ApiError {
    #[error(transparent)]
    Task(#[from] TaskServiceError),
    #[error(transparent)]
    Project(#[from] ProjectServiceError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Json(#[from] JsonRejection),
    #[error(transparent)]
    Query(#[from] QueryRejection),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Task(err) => match err {
                TaskServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
                TaskServiceError::TaskNotFound => (StatusCode::NOT_FOUND, "NotFoundError"),
                TaskServiceError::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError")
                }
            },
            ApiError::Project(err) => match err {
                ProjectServiceError::Validation(_) => {
                    (StatusCode::BAD_REQUEST, "ValidationError")
                }
                ProjectServiceError::ProjectNotFound => (StatusCode::NOT_FOUND, "NotFoundError"),
                ProjectServiceError::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError")
                }
            },
            ApiError::Auth(err) => match err {
                AuthError::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
                AuthError::InvalidCredentials | AuthError::Token(_) | AuthError::UnknownUser => {
                    (StatusCode::UNAUTHORIZED, "AuthError")
                }
                AuthError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
                AuthError::Hash(_) => (StatusCode::INTERNAL_SERVER_ERROR, "AuthError"),
            },
            ApiError::Deployment(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DeploymentError"),
            ApiError::Database(db_err) => match db_err {
                DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "NotFoundError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Json(_) | ApiError::Query(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "AuthError"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFoundError"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        }
    }

    fn message(&self, status: StatusCode) -> String {
        match self {
            ApiError::Auth(AuthError::Token(_) | AuthError::UnknownUser) => {
                "Unauthorized".to_string()
            }
            _ if status.is_server_error() => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Display of the error followed by each source in turn.
    fn chain(&self) -> Vec<String> {
        let mut chain = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            let text = err.to_string();
            if chain.last() != Some(&text) {
                chain.push(text);
            }
            source = std::error::Error::source(err);
        }
        chain
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = self.classify();

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }

        let message = self.message(status_code);
        let response = if error_detail_exposed() {
            ApiResponse::<(), ErrorDetail>::error_with_data(
                &message,
                ErrorDetail {
                    error_type,
                    detail: self.chain(),
                },
            )
        } else {
            ApiResponse::<(), ErrorDetail>::error(&message)
        };
        (status_code, Json(response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use utils_jwt::JwtError;

    use super::*;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn api_error_maps_to_expected_http_statuses() {
        assert_eq!(
            ApiError::BadRequest("bad".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::NotFound("missing".to_string())
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Internal("boom".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn domain_errors_map_to_expected_http_statuses() {
        assert_eq!(
            ApiError::from(TaskServiceError::Validation("Title is required".to_string()))
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(TaskServiceError::TaskNotFound)
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ProjectServiceError::ProjectNotFound)
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials)
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::Token(JwtError::Expired))
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(DbErr::Custom("disk full".to_string()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn client_errors_keep_their_message() {
        let (status, json) = body_json(ApiError::from(TaskServiceError::Validation(
            "Title is required".to_string(),
        )))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Validation error: Title is required");
    }

    #[tokio::test]
    async fn server_errors_hide_message_but_carry_detail() {
        let (status, json) =
            body_json(ApiError::from(TaskServiceError::Database(DbErr::Custom(
                "disk full".to_string(),
            ))))
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Internal server error");
        assert_eq!(json["error_data"]["error_type"], "DatabaseError");
        let detail = json["error_data"]["detail"].as_array().unwrap();
        assert!(
            detail
                .iter()
                .any(|line| line.as_str().unwrap().contains("disk full"))
        );
    }
}
