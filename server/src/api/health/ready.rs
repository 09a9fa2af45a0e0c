use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use cacahuete_core::{HealthResponse, HealthStatus};

#[utoipa::path(
    get,
    path = "/api/v1/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "The recipe store answers", body = HealthResponse),
        (status = 503, description = "The recipe store is unreachable", body = HealthResponse)
    )
)]
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store = state.executor.store();
    match store.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::new(HealthStatus::Ready))),
        Err(e) => {
            tracing::warn!(backend = store.backend_name(), error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::new(HealthStatus::NotReady)),
            )
        }
    }
}
