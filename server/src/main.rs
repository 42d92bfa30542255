mod api;
mod auth;
mod config;
mod db;
mod models;
mod schema;
mod store;
mod telemetry;

use axum::extract::{FromRef, MatchedPath};
use axum::http::Request;
use axum::middleware;
use axum::Router;
use saucier_core::{CatalogClient, RecipeService, ServiceDeps};
use std::env;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::db::DbPool;
use crate::store::PgStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub service: RecipeService,
}

impl FromRef<AppState> for Arc<DbPool> {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for RecipeService {
    fn from_ref(state: &AppState) -> Self {
        state.service.clone()
    }
}

/// Every route, without the telemetry layers.
fn router(state: AppState) -> Router {
    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    Router::new()
        .merge(api::public::router())
        .nest("/api/recipes", api::recipes::router())
        .nest("/api/users", api::users::router())
        .merge(swagger_ui)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        let spec = api::openapi()
            .to_pretty_json()
            .expect("Failed to serialize OpenAPI spec");
        println!("{}", spec);
        return;
    }

    dotenvy::dotenv().ok();
    telemetry::init();

    let config = Config::from_env().expect("Invalid configuration");

    let pool = Arc::new(db::create_pool(&config.database_url));

    let catalog = CatalogClient::builder()
        .base_url(config.catalog.base_url.clone())
        .api_key(config.catalog.api_key.clone())
        .timeout(config.catalog.timeout)
        .rate_limit_ms(config.catalog.rate_limit_ms)
        .build()
        .expect("Failed to build catalog client");
    if !catalog.is_configured() {
        tracing::warn!("CATALOG_API_KEY not set, catalog requests will be rejected upstream");
    }

    let store = Arc::new(PgStore::new(pool.clone()));
    let service = RecipeService::new(ServiceDeps {
        recipes: store.clone(),
        interactions: store.clone(),
        family: store,
        catalog: Arc::new(catalog),
    });

    let state = AppState { pool, service };

    let app = router(state)
        .layer(middleware::from_fn_with_state(
            config.track_query_count,
            telemetry::query_count_header_middleware,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %matched_path,
                    )
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &Span| {
                        let status = response.status().as_u16();
                        let queries = telemetry::query_count().unwrap_or(0);
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                db_queries = queries,
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                db_queries = queries,
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
        )
        .layer(middleware::from_fn(telemetry::query_counting_middleware));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!(
        "Server listening on {}",
        listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| config.bind_addr.clone())
    );
    tracing::info!("Swagger UI available at /swagger-ui/");

    axum::serve(listener, app).await.expect("Server error");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::StatusCode;
    use diesel::r2d2::{ConnectionManager, Pool};
    use saucier_core::{FakeCatalog, MemoryStore};
    use serde_json::Value;
    use tower::ServiceExt;

    /// Router over the in-memory store. The pool never connects, so any
    /// request that reaches Postgres fails.
    fn test_app(catalog: FakeCatalog) -> Router {
        let manager =
            ConnectionManager::<diesel::PgConnection>::new("postgres://unused@127.0.0.1:9/unused");
        let pool = Pool::builder()
            .min_idle(Some(0))
            .build_unchecked(manager);
        let store = Arc::new(MemoryStore::new());
        let service = RecipeService::new(ServiceDeps {
            recipes: store.clone(),
            interactions: store.clone(),
            family: store,
            catalog: Arc::new(catalog),
        });
        router(AppState {
            pool: Arc::new(pool),
            service,
        })
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_anonymous_random_recipes() {
        let app = test_app(
            FakeCatalog::new()
                .with_recipe(1, "Soup")
                .with_recipe(2, "Salad"),
        );
        let (status, body) = get(app, "/api/recipes/random?number=1").await;
        assert_eq!(status, StatusCode::OK);
        let recipes = body["recipes"].as_array().unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0]["source"], "catalog");
        assert_eq!(recipes[0]["viewed"], false);
    }

    #[tokio::test]
    async fn test_search_without_query_is_bad_request() {
        let (status, body) = get(test_app(FakeCatalog::new()), "/api/recipes/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("query"));
    }

    #[tokio::test]
    async fn test_unknown_recipe_is_not_found() {
        let (status, _) = get(test_app(FakeCatalog::new()), "/api/recipes/not-an-id").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_catalog_outage_is_bad_gateway() {
        let catalog = FakeCatalog::new();
        catalog.set_failing(true);
        let (status, body) = get(test_app(catalog), "/api/recipes/716429").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body["error"].as_str().unwrap().contains("fake"));
    }

    #[tokio::test]
    async fn test_user_routes_require_token() {
        let (status, _) = get(test_app(FakeCatalog::new()), "/api/users/favorites").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
