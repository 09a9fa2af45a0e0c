pub mod alive;
pub mod ready;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for health probes (mounted at /health)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/alive", get(alive::alive))
        .route("/live", get(alive::live))
        .route("/ready", get(ready::ready))
}

#[derive(OpenApi)]
#[openapi(paths(alive::alive, alive::live, ready::ready))]
pub struct ApiDoc;
