use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use db::models::user::UserRef;
use deployment::Deployment;

use crate::{DeploymentImpl, error::ApiError};

/// The user a bearer token was issued to, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRef);

fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let (prefix, rest) = trimmed.split_once(' ')?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn extract_request_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
        .map(str::to_string)
}

pub async fn require_api_auth(
    State(deployment): State<DeploymentImpl>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_request_token(&req) else {
        tracing::warn!(
            path = %req.uri().path(),
            method = %req.method(),
            reason = "missing_token",
            "Unauthorized API request"
        );
        return ApiError::Unauthorized.into_response();
    };

    match deployment
        .auth()
        .authenticate(&deployment.db().pool, &token)
        .await
    {
        Ok(user) => {
            req.extensions_mut().insert(CurrentUser(user));
            next.run(req).await
        }
        Err(err) => {
            tracing::warn!(
                path = %req.uri().path(),
                method = %req.method(),
                reason = %err,
                "Unauthorized API request"
            );
            ApiError::from(err).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_authorization_bearer;

    #[test]
    fn bearer_prefix_is_case_insensitive() {
        assert_eq!(parse_authorization_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_authorization_bearer("bearer   abc "), Some("abc"));
        assert_eq!(parse_authorization_bearer("Basic abc"), None);
        assert_eq!(parse_authorization_bearer("Bearer "), None);
        assert_eq!(parse_authorization_bearer("abc"), None);
    }
}
