//! Facility Desk Library
//!
//! Core of the facility maintenance API: organizations and their departments,
//! the join-request workflow, maintenance tickets and the role policy that
//! gates them.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use db::DbPool;
pub use middleware::{auth_middleware, AuthUser, Claims};
use services::storage::BlobStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Database connection pool
    pub db: DbPool,
    /// Uploaded photo storage
    pub storage: Arc<dyn BlobStore>,
}
