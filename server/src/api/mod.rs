pub mod health;
pub mod recipes;

use std::collections::HashMap;

use axum::body::Bytes;
use axum::middleware;
use axum::Router;
use cacahuete_core::{
    DeletedRecipe, Dish, ErrorKind, ErrorResponse, HealthResponse, HealthStatus, IngredientRef,
    RawRequest, Recipe, RequestExecutor, Timer,
};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::auth::{require_secret, SharedSecret};
use crate::AppState;

/// Everything the route handlers share.
#[derive(Debug)]
pub struct ApiHandler {
    pub executor: RequestExecutor,
    pub secret: Option<SharedSecret>,
}

/// All API routes, relative to the configured prefix. The shared secret, when
/// configured, guards the recipe routes but never the health probes.
pub fn router(state: AppState) -> Router<AppState> {
    let recipes = recipes::router().layer(middleware::from_fn_with_state(state, require_secret));
    Router::new()
        .nest("/health", health::router())
        .nest("/recipe", recipes)
}

/// Raw request for the pipeline from path parameters and an optional body.
pub(crate) fn raw_request(params: HashMap<String, String>, body: Option<Bytes>) -> RawRequest {
    let raw = body.map(RawRequest::from_body).unwrap_or_default();
    params
        .into_iter()
        .fold(raw, |raw, (name, value)| raw.with_param(name, value))
}

/// Route prefix the path annotations are written against.
pub const DOCUMENTED_PREFIX: &str = "/api/v1";

/// OpenAPI spec with paths rebased onto the configured route prefix.
pub fn openapi_at(prefix: &str) -> utoipa::openapi::OpenApi {
    let mut spec = openapi();
    if prefix != DOCUMENTED_PREFIX {
        let paths = std::mem::take(&mut spec.paths.paths);
        spec.paths.paths = paths
            .into_iter()
            .map(|(path, item)| {
                let rest = path.strip_prefix(DOCUMENTED_PREFIX).unwrap_or(&path);
                (format!("{prefix}{rest}"), item)
            })
            .collect();
    }
    spec
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(
        info(title = "Cacahuete recipe API"),
        components(schemas(
            ErrorResponse,
            ErrorKind,
            Recipe,
            Dish,
            Timer,
            IngredientRef,
            DeletedRecipe,
            HealthResponse,
            HealthStatus,
        ))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> =
        vec![health::ApiDoc::openapi(), recipes::ApiDoc::openapi()];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}
