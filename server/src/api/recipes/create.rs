use crate::api::raw_request;
use crate::AppState;
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use cacahuete_core::operations;
use cacahuete_core::{ApiError, ErrorResponse, Recipe};

/// Store a new recipe. An id is generated unless the body carries one.
#[utoipa::path(
    post,
    path = "/api/v1/recipe",
    tag = "recipes",
    request_body = Recipe,
    responses(
        (status = 201, description = "Recipe created, with its id", body = Recipe),
        (status = 400, description = "Missing or malformed body", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "A recipe with this id already exists", body = ErrorResponse),
        (status = 422, description = "Recipe breaks a validation rule", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Recipe>), ApiError> {
    let recipe = state
        .executor
        .execute(operations::save_request(raw_request(
            Default::default(),
            Some(body),
        )))
        .await
        .map_err(ApiError::conflict_on_duplicate)?;
    Ok((StatusCode::CREATED, Json(recipe)))
}
