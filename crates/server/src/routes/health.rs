use axum::response::Json;
use serde::Serialize;

pub const SERVICE_NAME: &str = "task-tracker-api";

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub ok: bool,
    pub service: &'static str,
}

pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        ok: true,
        service: SERVICE_NAME,
    })
}
