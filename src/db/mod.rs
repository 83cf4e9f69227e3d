//! Database layer
//!
//! SQLite storage for users, the organization/department hierarchy, join
//! requests and maintenance tickets. Each repository borrows the pool and
//! returns `anyhow::Result`; multi-row writes open their own transaction.

pub mod department_repository;
pub mod join_request_repository;
pub mod maintenance_repository;
pub mod organization_repository;
pub mod user_repository;

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    Pool, Sqlite,
};

use crate::config::DatabaseConfig;

pub use department_repository::DepartmentRepository;
pub use join_request_repository::JoinRequestRepository;
pub use maintenance_repository::{MaintenanceFilter, MaintenanceRepository};
pub use organization_repository::OrganizationRepository;
pub use user_repository::UserRepository;

/// Database connection pool type
pub type DbPool = Pool<Sqlite>;

/// Initialize the database connection pool and apply migrations
pub async fn init_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let connect_options = config
        .url
        .parse::<SqliteConnectOptions>()
        .context("Failed to parse database URL")?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(config.connect_timeout_secs))
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect_with(connect_options)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

/// Parse a stored timestamp, accepting RFC 3339 and SQLite's default format
pub(crate) fn parse_db_timestamp(ts: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S") {
        return DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc);
    }
    Utc::now()
}

/// Current time in storage format
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}
