use std::collections::HashMap;

use crate::api::raw_request;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use cacahuete_core::operations;
use cacahuete_core::{ApiError, ErrorResponse, Recipe};

/// First recipe whose name contains the given text, ignoring case.
#[utoipa::path(
    get,
    path = "/api/v1/recipe/title/{title}",
    tag = "recipes",
    params(
        ("title" = String, Path, description = "Part of the recipe name")
    ),
    responses(
        (status = 200, description = "Matching recipe", body = Recipe),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "No recipe name matches", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn find_by_title(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = state
        .executor
        .execute(operations::find_by_title_request(raw_request(params, None)))
        .await
        .map_err(ApiError::not_found_on_miss)?;
    Ok(Json(recipe))
}
