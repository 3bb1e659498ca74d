// Health and metrics endpoints

use actix_web::{HttpResponse, http::header::ContentType, web};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::model::app_state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    #[schema(value_type = String, example = "UP")]
    pub status: &'static str,
    #[schema(value_type = String, example = "memory")]
    pub backend: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /health`: liveness plus a backend reachability check
#[utoipa::path(
    get,
    path = "/health",
    tag = "operations",
    responses(
        (status = 200, description = "Service and backend are up", body = HealthStatus),
        (status = 503, description = "Backend unreachable", body = HealthStatus)
    )
)]
pub async fn health(data: web::Data<AppState>) -> HttpResponse {
    let backend = data.backend.name();
    match data
        .op_context()
        .run("health_check", data.backend.health_check())
        .await
    {
        Ok(()) => HttpResponse::Ok().json(HealthStatus {
            status: "UP",
            backend,
            error: None,
        }),
        Err(err) => {
            warn!(backend, error = %err, "Backend health check failed");
            HttpResponse::ServiceUnavailable().json(HealthStatus {
                status: "DOWN",
                backend,
                error: Some(err.to_string()),
            })
        }
    }
}

/// `GET /metrics`: Prometheus text exposition
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "operations",
    responses(
        (status = 200, description = "Prometheus text exposition", body = String, content_type = "text/plain"),
        (status = 503, description = "Metrics recorder not installed")
    )
)]
pub async fn metrics(data: web::Data<AppState>) -> HttpResponse {
    match &data.metrics_handle {
        Some(handle) => HttpResponse::Ok()
            .content_type(ContentType::plaintext())
            .body(handle.render()),
        None => HttpResponse::ServiceUnavailable()
            .content_type(ContentType::plaintext())
            .body("metrics recorder not installed"),
    }
}
