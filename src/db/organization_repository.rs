//! Organization (tenant) repository

use std::collections::HashMap;

use anyhow::{Context, Result};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{now_timestamp, parse_db_timestamp};
use crate::models::{CreateOrganizationRequest, Organization, Role, UpdateOrganizationRequest};

#[derive(Debug, sqlx::FromRow)]
struct OrganizationRow {
    id: i64,
    name: String,
    description: Option<String>,
    url: Option<String>,
    owner_id: i64,
    created_at: String,
    updated_at: String,
}

const ORGANIZATION_COLUMNS: &str = "id, name, description, url, owner_id, created_at, updated_at";

pub struct OrganizationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrganizationRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Organization>> {
        let rows = sqlx::query_as::<_, OrganizationRow>(&format!(
            "SELECT {} FROM organizations ORDER BY id",
            ORGANIZATION_COLUMNS
        ))
        .fetch_all(self.pool)
        .await
        .context("Failed to list organizations")?;

        Ok(rows.into_iter().map(row_to_org).collect())
    }

    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Organization>> {
        let rows = sqlx::query_as::<_, OrganizationRow>(&format!(
            "SELECT {} FROM organizations WHERE owner_id = ? ORDER BY id",
            ORGANIZATION_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(self.pool)
        .await
        .context("Failed to list owned organizations")?;

        Ok(rows.into_iter().map(row_to_org).collect())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            "SELECT {} FROM organizations WHERE id = ?",
            ORGANIZATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to get organization")?;

        Ok(row.map(row_to_org))
    }

    pub async fn get_many(&self, ids: &[i64]) -> Result<HashMap<i64, Organization>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM organizations WHERE id IN (",
            ORGANIZATION_COLUMNS
        ));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = builder
            .build_query_as::<OrganizationRow>()
            .fetch_all(self.pool)
            .await
            .context("Failed to load organizations")?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let org = row_to_org(row);
                (org.id, org)
            })
            .collect())
    }

    /// Insert an organization and promote its creator to `owner` atomically
    pub async fn create_for_owner(
        &self,
        owner_id: i64,
        req: &CreateOrganizationRequest,
    ) -> Result<Organization> {
        let now = now_timestamp();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let id = sqlx::query(
            r#"
            INSERT INTO organizations (name, description, url, owner_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.url)
        .bind(owner_id)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .context("Failed to create organization")?
        .last_insert_rowid();

        sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(Role::Owner.as_str())
            .bind(&now)
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .context("Failed to promote organization owner")?;

        tx.commit().await.context("Failed to commit organization")?;

        self.get_by_id(id)
            .await?
            .context("Failed to retrieve created organization")
    }

    pub async fn update(
        &self,
        id: i64,
        req: &UpdateOrganizationRequest,
    ) -> Result<Option<Organization>> {
        let Some(existing) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let name = req.name.clone().unwrap_or(existing.name);
        let description = req.description.clone().or(existing.description);
        let url = req.url.clone().or(existing.url);

        sqlx::query(
            r#"
            UPDATE organizations
            SET name = ?, description = ?, url = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&name)
        .bind(&description)
        .bind(&url)
        .bind(now_timestamp())
        .bind(id)
        .execute(self.pool)
        .await
        .context("Failed to update organization")?;

        self.get_by_id(id).await
    }

    /// Delete an organization and demote the acting owner to `user` atomically
    ///
    /// The demotion is global: it applies even when the owner still owns
    /// other organizations.
    pub async fn delete_and_demote(&self, id: i64, owner_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(Role::User.as_str())
            .bind(now_timestamp())
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .context("Failed to demote organization owner")?;

        let result = sqlx::query("DELETE FROM organizations WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete organization")?;

        tx.commit().await.context("Failed to commit organization delete")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_org(row: OrganizationRow) -> Organization {
    Organization {
        id: row.id,
        name: row.name,
        description: row.description,
        url: row.url,
        owner_id: row.owner_id,
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    }
}
