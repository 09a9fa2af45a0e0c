use std::collections::HashMap;

use crate::api::raw_request;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use cacahuete_core::operations;
use cacahuete_core::{ApiError, ErrorResponse, Recipe};

#[utoipa::path(
    get,
    path = "/api/v1/recipe/ingredient/{id}",
    tag = "recipes",
    params(
        ("id" = String, Path, description = "Ingredient catalog ID")
    ),
    responses(
        (status = 200, description = "Recipes using this ingredient, possibly none", body = Vec<Recipe>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn find_by_ingredient(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipes = state
        .executor
        .execute(operations::find_by_ingredient_id_request(raw_request(
            params, None,
        )))
        .await?;
    Ok(Json(recipes))
}
