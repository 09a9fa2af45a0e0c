use crate::AppState;
use axum::{extract::State, Json};
use cacahuete_core::operations;
use cacahuete_core::{ApiError, ErrorResponse, Recipe};

#[utoipa::path(
    get,
    path = "/api/v1/recipe",
    tag = "recipes",
    responses(
        (status = 200, description = "Every recipe in the catalog", body = Vec<Recipe>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_recipes(State(state): State<AppState>) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipes = state
        .executor
        .execute(operations::find_all_request())
        .await?;
    Ok(Json(recipes))
}
