//! Middleware components
//!
//! Bearer-token authentication for the protected API.

pub mod auth;

pub use auth::{auth_middleware, AuthUser, Claims};
