//! Integration tests for Facility Desk
//!
//! These tests drive the full router against a temporary SQLite file
//! with the auth middleware in place.

mod auth_tests;
mod department_tests;
mod maintenance_tests;
