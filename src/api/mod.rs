//! API routes and handlers
//!
//! This module defines all API endpoints and their routing.

use axum::{extract::DefaultBodyLimit, middleware::from_fn_with_state, Router};
use tower_http::services::ServeDir;

use crate::{middleware::auth_middleware, AppState};

mod auth;
mod departments;
pub mod extract;
mod join_requests;
mod maintenance;
mod organizations;
mod profile;

/// Public API routes (no authentication required)
pub fn public_routes() -> Router<AppState> {
    Router::new().merge(auth::public_routes())
}

/// Protected API routes (authentication required)
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .merge(profile::routes())
        .merge(organizations::routes())
        .merge(join_requests::routes())
        .merge(departments::routes())
        .merge(maintenance::routes())
}

/// The application router: `/api` with bearer auth on protected routes,
/// plus uploaded files served under the storage prefix
pub fn app_router(state: AppState) -> Router {
    let protected =
        protected_routes().layer(from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new()
        .merge(public_routes())
        .merge(protected)
        .layer(DefaultBodyLimit::max(state.config.max_request_bytes()));

    let storage_path = match state.config.storage.public_prefix.trim_end_matches('/') {
        "" => "/storage".to_string(),
        prefix => prefix.to_string(),
    };
    let uploads = ServeDir::new(&state.config.storage.upload_dir);

    Router::new()
        .nest("/api", api)
        .nest_service(&storage_path, uploads)
        .with_state(state)
}
