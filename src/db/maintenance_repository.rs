//! Maintenance request and photo repository

use std::collections::HashMap;

use anyhow::{Context, Result};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{now_timestamp, parse_db_timestamp};
use crate::models::{MaintenanceRequest, MaintenanceStatus, NewMaintenanceRequest, Photo};

#[derive(Debug, sqlx::FromRow)]
struct MaintenanceRow {
    id: i64,
    user_id: i64,
    department_id: i64,
    assigned_to: Option<i64>,
    title: String,
    description: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, sqlx::FromRow)]
struct PhotoRow {
    id: i64,
    maintenance_request_id: i64,
    url: String,
    created_at: String,
    updated_at: String,
}

const MAINTENANCE_COLUMNS: &str = "mr.id, mr.user_id, mr.department_id, mr.assigned_to, mr.title, \
     mr.description, mr.status, mr.created_at, mr.updated_at";

/// Row filter for listing requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceFilter {
    /// Requests created by the user
    CreatedBy(i64),
    /// Requests in departments the user administers
    AdministeredBy(i64),
    /// Requests assigned to the user
    AssignedTo(i64),
    All,
}

pub struct MaintenanceRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MaintenanceRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: MaintenanceFilter) -> Result<Vec<MaintenanceRequest>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM maintenance_requests mr",
            MAINTENANCE_COLUMNS
        ));

        match filter {
            MaintenanceFilter::CreatedBy(user_id) => {
                builder.push(" WHERE mr.user_id = ").push_bind(user_id);
            }
            MaintenanceFilter::AdministeredBy(user_id) => {
                builder
                    .push(" JOIN departments d ON d.id = mr.department_id WHERE d.admin_id = ")
                    .push_bind(user_id);
            }
            MaintenanceFilter::AssignedTo(user_id) => {
                builder.push(" WHERE mr.assigned_to = ").push_bind(user_id);
            }
            MaintenanceFilter::All => {}
        }
        builder.push(" ORDER BY mr.created_at DESC, mr.id DESC");

        let rows = builder
            .build_query_as::<MaintenanceRow>()
            .fetch_all(self.pool)
            .await
            .context("Failed to list maintenance requests")?;

        Ok(rows.into_iter().map(row_to_request).collect())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<MaintenanceRequest>> {
        let row = sqlx::query_as::<_, MaintenanceRow>(&format!(
            "SELECT {} FROM maintenance_requests mr WHERE mr.id = ?",
            MAINTENANCE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to get maintenance request")?;

        Ok(row.map(row_to_request))
    }

    /// Insert a request; `assigned_to` always starts empty
    pub async fn create(&self, req: &NewMaintenanceRequest) -> Result<MaintenanceRequest> {
        let now = now_timestamp();

        let id = sqlx::query(
            r#"
            INSERT INTO maintenance_requests
                (user_id, department_id, assigned_to, title, description, status, created_at, updated_at)
            VALUES (?, ?, NULL, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(req.user_id)
        .bind(req.department_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.status.as_str())
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await
        .context("Failed to create maintenance request")?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .context("Failed to retrieve created maintenance request")
    }

    pub async fn assign(&self, id: i64, user_id: i64) -> Result<Option<MaintenanceRequest>> {
        sqlx::query("UPDATE maintenance_requests SET assigned_to = ?, updated_at = ? WHERE id = ?")
            .bind(user_id)
            .bind(now_timestamp())
            .bind(id)
            .execute(self.pool)
            .await
            .context("Failed to assign maintenance request")?;

        self.get_by_id(id).await
    }

    pub async fn set_status(
        &self,
        id: i64,
        status: MaintenanceStatus,
    ) -> Result<Option<MaintenanceRequest>> {
        sqlx::query("UPDATE maintenance_requests SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now_timestamp())
            .bind(id)
            .execute(self.pool)
            .await
            .context("Failed to update maintenance request status")?;

        self.get_by_id(id).await
    }

    pub async fn add_photo(&self, maintenance_request_id: i64, url: &str) -> Result<Photo> {
        let now = now_timestamp();

        let id = sqlx::query(
            r#"
            INSERT INTO photos (maintenance_request_id, url, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(maintenance_request_id)
        .bind(url)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await
        .context("Failed to record photo")?
        .last_insert_rowid();

        let row = sqlx::query_as::<_, PhotoRow>(
            "SELECT id, maintenance_request_id, url, created_at, updated_at FROM photos WHERE id = ?",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await
        .context("Failed to retrieve recorded photo")?;

        Ok(row_to_photo(row))
    }

    /// Photos of several requests, grouped by request id
    pub async fn photos_for(&self, request_ids: &[i64]) -> Result<HashMap<i64, Vec<Photo>>> {
        if request_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, maintenance_request_id, url, created_at, updated_at FROM photos WHERE maintenance_request_id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in request_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY id");

        let rows = builder
            .build_query_as::<PhotoRow>()
            .fetch_all(self.pool)
            .await
            .context("Failed to load photos")?;

        let mut grouped: HashMap<i64, Vec<Photo>> = HashMap::new();
        for row in rows {
            let photo = row_to_photo(row);
            grouped
                .entry(photo.maintenance_request_id)
                .or_default()
                .push(photo);
        }
        Ok(grouped)
    }
}

fn row_to_request(row: MaintenanceRow) -> MaintenanceRequest {
    MaintenanceRequest {
        id: row.id,
        user_id: row.user_id,
        department_id: row.department_id,
        assigned_to: row.assigned_to,
        title: row.title,
        description: row.description,
        status: row.status.parse().unwrap_or_default(),
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    }
}

fn row_to_photo(row: PhotoRow) -> Photo {
    Photo {
        id: row.id,
        maintenance_request_id: row.maintenance_request_id,
        url: row.url,
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    }
}
