pub mod by_author;
pub mod by_ingredient;
pub mod by_title;
pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for recipe endpoints (mounted at /recipe)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_recipes).post(create::create_recipe))
        .route("/user/{id}", get(by_author::find_by_author))
        .route("/ingredient/{id}", get(by_ingredient::find_by_ingredient))
        .route("/title/{title}", get(by_title::find_by_title))
        .route(
            "/{id}",
            get(get::get_recipe)
                .put(update::update_recipe)
                .delete(delete::delete_recipe),
        )
}

#[derive(OpenApi)]
#[openapi(paths(
    list::list_recipes,
    create::create_recipe,
    get::get_recipe,
    update::update_recipe,
    delete::delete_recipe,
    by_title::find_by_title,
    by_author::find_by_author,
    by_ingredient::find_by_ingredient,
))]
pub struct ApiDoc;
