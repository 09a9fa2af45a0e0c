use axum::Json;
use cacahuete_core::{HealthResponse, HealthStatus};

#[utoipa::path(
    get,
    path = "/api/v1/health/alive",
    tag = "health",
    responses(
        (status = 200, description = "The process is up", body = HealthResponse)
    )
)]
pub async fn alive() -> Json<HealthResponse> {
    Json(HealthResponse::new(HealthStatus::Alive))
}

/// Same probe under the name some orchestrators expect.
#[utoipa::path(
    get,
    path = "/api/v1/health/live",
    tag = "health",
    responses(
        (status = 200, description = "The process is up", body = HealthResponse)
    )
)]
pub async fn live() -> Json<HealthResponse> {
    alive().await
}
