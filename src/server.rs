//! Router assembly.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::api::auth::AuthSettings;
use crate::db::Store;

/// Application state shared across handlers.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: AuthSettings,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, auth: AuthSettings) -> Arc<Self> {
        Arc::new(Self { store, auth })
    }
}

/// Build the full application: API routes, static files and middleware.
///
/// Paths not claimed by the API are served from `static_dir`, with `/`
/// resolving to `index.html`. Oversized bodies are rejected by the JSON
/// extractor so the 413 keeps the `{"error": ...}` shape.
pub fn router(state: Arc<AppState>, static_dir: impl AsRef<Path>, max_body_bytes: usize) -> Router {
    Router::new()
        // Player API
        .route("/api/register", post(api::users::register))
        .route("/api/login", post(api::users::login))
        .route("/api/payment", post(api::users::submit_payment))
        .route("/api/user/status", get(api::users::status))
        .route("/api/user/update-chances", post(api::users::update_chances))
        .route("/api/user/win", post(api::users::record_win))
        // Game settings
        .route(
            "/api/settings",
            get(api::settings::get).post(api::settings::update),
        )
        // Admin
        .route("/api/admin/requests", get(api::admin::list_requests))
        .route("/api/admin/approve", post(api::admin::approve))
        .route("/api/admin/deny", post(api::admin::deny))
        // Health check
        .route("/health", get(|| async { "OK" }))
        .fallback_service(ServeDir::new(static_dir))
        // Middleware
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        // CorsLayer only sets these on preflight responses.
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Authorization"),
        ))
        .with_state(state)
}
