use axum::middleware;
use axum::routing::{get, post, put};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::health;
use super::link_handlers;
use super::redirect;
use super::AppState;

/// Create application router
pub fn create_router(state: Arc<AppState>, allowed_origins: Vec<String>) -> axum::Router {
    use crate::middleware::{request_context_middleware, request_id_middleware};

    // Configure CORS with specific origins
    let cors = if allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<http::HeaderValue> = allowed_origins
            .iter()
            .filter_map(|s| s.parse::<http::HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // REST surface consumed by the dashboard client. The `{id}` segment
    // carries the short code for the info route and the numeric id
    // everywhere else; matchit requires one parameter name per position.
    let api_routes = axum::Router::new()
        .route("/", post(link_handlers::create_link))
        .route(
            "/{id}",
            put(link_handlers::update_link).delete(link_handlers::delete_link),
        )
        .route("/{id}/info", get(link_handlers::get_link_info))
        .route("/{id}/analytics", get(link_handlers::get_link_analytics));

    // Public redirect endpoint plus health, outside the API prefix
    axum::Router::new()
        .nest("/api/v1/urls", api_routes)
        .route("/{code}", get(redirect::resolve_link))
        .route("/_health", get(health::health_check))
        .layer(cors)
        .layer(middleware::from_fn(request_context_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
