mod api;
mod auth;
mod config;
mod db;
mod schema;
mod store;
mod telemetry;

use std::env;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::Router;
use cacahuete_core::{MemoryStore, RecipeStore, RequestExecutor};
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::ApiHandler;
use crate::auth::SharedSecret;
use crate::config::Config;
use crate::store::PgDocumentStore;

/// Application state shared across all handlers
pub type AppState = Arc<ApiHandler>;

fn open_store(config: &Config) -> anyhow::Result<Arc<dyn RecipeStore>> {
    match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url, config.db_pool_size, config.db_connect_timeout)
                .context("failed to connect to the recipe database")?;
            Ok(Arc::new(PgDocumentStore::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, recipes are kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for the shutdown signal");
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        let route = Config::from_env()
            .map(|config| config.route)
            .unwrap_or_else(|_| api::DOCUMENTED_PREFIX.to_string());
        println!("{}", api::openapi_at(&route).to_pretty_json()?);
        return Ok(());
    }

    let config = Config::from_env()?;
    let telemetry = telemetry::init(&config)?;
    tracing::debug!(?config, "Configuration loaded");

    let store = open_store(&config)?;
    let state: AppState = Arc::new(ApiHandler {
        executor: RequestExecutor::with_current_dispatch(store.clone()),
        secret: config.shared_secret.as_deref().map(SharedSecret::new),
    });
    if state.secret.is_none() {
        tracing::warn!("JWT_SECRET not set, recipe routes are open");
    }

    let api_router = api::router(state.clone());
    let api_router = if config.route.is_empty() {
        api_router
    } else {
        Router::new().nest(&config.route, api_router)
    };

    let swagger_ui =
        SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi_at(&config.route));

    let app = Router::new()
        .merge(api_router)
        .merge(swagger_ui)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    // Probes are polled constantly
                    if matched_path.contains("/health/") {
                        tracing::trace_span!("http_request")
                    } else {
                        tracing::info_span!(
                            "http_request",
                            method = %request.method(),
                            path = %matched_path,
                        )
                    }
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        if span.metadata().map(|m| m.level()) == Some(&tracing::Level::TRACE) {
                            return;
                        }
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &Span| {
                        tracing::error!(
                            error = %error,
                            latency_ms = %latency.as_millis(),
                            "request failed"
                        );
                    },
                ),
        );

    let listener = tokio::net::TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;

    let local_addr = listener.local_addr()?;
    tracing::info!(
        backend = store.backend_name(),
        "Server listening on {}{}",
        local_addr,
        config.route
    );
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    telemetry.shutdown();
    Ok(())
}
