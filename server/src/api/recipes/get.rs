use std::collections::HashMap;

use crate::api::raw_request;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use cacahuete_core::operations;
use cacahuete_core::{ApiError, ErrorResponse, Recipe};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/v1/recipe/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = Recipe),
        (status = 400, description = "Malformed recipe ID", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = state
        .executor
        .execute(operations::find_by_id_request(raw_request(params, None)))
        .await
        .map_err(ApiError::not_found_on_miss)?;
    Ok(Json(recipe))
}
