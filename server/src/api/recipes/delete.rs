use std::collections::HashMap;

use crate::api::raw_request;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use cacahuete_core::operations;
use cacahuete_core::{ApiError, ErrorResponse};
use uuid::Uuid;

#[utoipa::path(
    delete,
    path = "/api/v1/recipe/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 400, description = "Malformed recipe ID", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .executor
        .execute(operations::delete_by_id_request(raw_request(params, None)))
        .await
        .map_err(ApiError::not_found_on_miss)?;
    tracing::info!(id = %deleted.id, "Recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}
