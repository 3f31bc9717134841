use axum::{
    Router,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use services::services::config::Config;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{DeploymentImpl, routes};

mod auth;

pub use auth::CurrentUser;

fn cors_layer(config: &Config) -> CorsLayer {
    let allow_origin = match config.cors_origin.as_deref() {
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(origin) => AllowOrigin::exact(origin),
            Err(_) => {
                tracing::warn!(origin, "Invalid CORS origin, allowing any origin");
                AllowOrigin::any()
            }
        },
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn router(deployment: DeploymentImpl, config: &Config) -> Router {
    let api_routes = Router::new()
        .merge(routes::tasks::router(&deployment))
        .merge(routes::projects::router(&deployment))
        .merge(routes::users::router())
        .merge(routes::history::router())
        .merge(routes::notifications::router())
        .merge(routes::reports::router())
        .merge(routes::export::router())
        .layer(from_fn_with_state(
            deployment.clone(),
            auth::require_api_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/login", post(routes::auth::login));

    Router::new()
        .nest("/api", public_routes.merge(api_routes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
        .with_state(deployment)
}
