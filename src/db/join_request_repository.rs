//! Organization join request repository

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::{now_timestamp, parse_db_timestamp};
use crate::models::{JoinRequest, JoinRequestStatus};

#[derive(Debug, sqlx::FromRow)]
struct JoinRequestRow {
    id: i64,
    user_id: i64,
    organization_id: i64,
    status: String,
    created_at: String,
    updated_at: String,
}

const JOIN_REQUEST_COLUMNS: &str = "id, user_id, organization_id, status, created_at, updated_at";

pub struct JoinRequestRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> JoinRequestRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<JoinRequest>> {
        let row = sqlx::query_as::<_, JoinRequestRow>(&format!(
            "SELECT {} FROM organization_user_requests WHERE id = ?",
            JOIN_REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to get join request")?;

        Ok(row.map(row_to_request))
    }

    pub async fn find_for_pair(
        &self,
        user_id: i64,
        organization_id: i64,
    ) -> Result<Option<JoinRequest>> {
        let row = sqlx::query_as::<_, JoinRequestRow>(&format!(
            "SELECT {} FROM organization_user_requests WHERE user_id = ? AND organization_id = ?",
            JOIN_REQUEST_COLUMNS
        ))
        .bind(user_id)
        .bind(organization_id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to look up join request")?;

        Ok(row.map(row_to_request))
    }

    /// Insert a `pending` request
    ///
    /// A second insert for the same pair fails on the UNIQUE constraint.
    pub async fn create(&self, user_id: i64, organization_id: i64) -> Result<JoinRequest> {
        let now = now_timestamp();

        let id = sqlx::query(
            r#"
            INSERT INTO organization_user_requests (user_id, organization_id, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .bind(JoinRequestStatus::Pending.as_str())
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await
        .context("Failed to create join request")?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .context("Failed to retrieve created join request")
    }

    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<JoinRequest>> {
        let rows = sqlx::query_as::<_, JoinRequestRow>(&format!(
            "SELECT {} FROM organization_user_requests WHERE user_id = ? ORDER BY created_at DESC, id DESC",
            JOIN_REQUEST_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .context("Failed to list user join requests")?;

        Ok(rows.into_iter().map(row_to_request).collect())
    }

    /// Requests of one organization in one status, newest first
    pub async fn list_by_organization(
        &self,
        organization_id: i64,
        status: JoinRequestStatus,
    ) -> Result<Vec<JoinRequest>> {
        let rows = sqlx::query_as::<_, JoinRequestRow>(&format!(
            r#"
            SELECT {} FROM organization_user_requests
            WHERE organization_id = ? AND status = ?
            ORDER BY created_at DESC, id DESC
            "#,
            JOIN_REQUEST_COLUMNS
        ))
        .bind(organization_id)
        .bind(status.as_str())
        .fetch_all(self.pool)
        .await
        .context("Failed to list organization join requests")?;

        Ok(rows.into_iter().map(row_to_request).collect())
    }

    /// Move a `pending` request to `status`; `None` when it was no longer pending
    pub async fn decide_pending(
        &self,
        id: i64,
        status: JoinRequestStatus,
    ) -> Result<Option<JoinRequest>> {
        let result = sqlx::query(
            "UPDATE organization_user_requests SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(status.as_str())
        .bind(now_timestamp())
        .bind(id)
        .bind(JoinRequestStatus::Pending.as_str())
        .execute(self.pool)
        .await
        .context("Failed to update join request status")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Delete a request only while it is `pending` and owned by `user_id`
    pub async fn delete_pending(&self, id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM organization_user_requests WHERE id = ? AND user_id = ? AND status = ?",
        )
        .bind(id)
        .bind(user_id)
        .bind(JoinRequestStatus::Pending.as_str())
        .execute(self.pool)
        .await
        .context("Failed to cancel join request")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_request(row: JoinRequestRow) -> JoinRequest {
    JoinRequest {
        id: row.id,
        user_id: row.user_id,
        organization_id: row.organization_id,
        status: row.status.parse().unwrap_or_default(),
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    }
}
