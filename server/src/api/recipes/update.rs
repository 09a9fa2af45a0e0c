use std::collections::HashMap;

use crate::api::raw_request;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use cacahuete_core::operations;
use cacahuete_core::{ApiError, ErrorResponse, Recipe};
use uuid::Uuid;

/// Replace a stored recipe. The id in the path wins over any id in the body.
#[utoipa::path(
    put,
    path = "/api/v1/recipe/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = Recipe,
    responses(
        (status = 200, description = "Recipe replaced", body = Recipe),
        (status = 400, description = "Malformed body or recipe ID", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 422, description = "Recipe breaks a validation rule", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = state
        .executor
        .execute(operations::upsert_by_id_request(raw_request(
            params,
            Some(body),
        )))
        .await
        .map_err(ApiError::not_found_on_miss)?;
    Ok(Json(recipe))
}
