//! Department and department membership repository

use std::collections::HashMap;

use anyhow::{Context, Result};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{now_timestamp, parse_db_timestamp};
use crate::models::{Department, Role};

#[derive(Debug, sqlx::FromRow)]
struct DepartmentRow {
    id: i64,
    name: String,
    description: Option<String>,
    organization_id: i64,
    admin_id: Option<i64>,
    created_at: String,
    updated_at: String,
}

const DEPARTMENT_COLUMNS: &str =
    "id, name, description, organization_id, admin_id, created_at, updated_at";

pub struct DepartmentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DepartmentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Department>> {
        let row = sqlx::query_as::<_, DepartmentRow>(&format!(
            "SELECT {} FROM departments WHERE id = ?",
            DEPARTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to get department")?;

        Ok(row.map(row_to_department))
    }

    pub async fn list_by_organization(&self, organization_id: i64) -> Result<Vec<Department>> {
        let rows = sqlx::query_as::<_, DepartmentRow>(&format!(
            "SELECT {} FROM departments WHERE organization_id = ? ORDER BY id",
            DEPARTMENT_COLUMNS
        ))
        .bind(organization_id)
        .fetch_all(self.pool)
        .await
        .context("Failed to list departments")?;

        Ok(rows.into_iter().map(row_to_department).collect())
    }

    pub async fn get_many(&self, ids: &[i64]) -> Result<HashMap<i64, Department>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM departments WHERE id IN (",
            DEPARTMENT_COLUMNS
        ));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = builder
            .build_query_as::<DepartmentRow>()
            .fetch_all(self.pool)
            .await
            .context("Failed to load departments")?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let dept = row_to_department(row);
                (dept.id, dept)
            })
            .collect())
    }

    pub async fn create(
        &self,
        organization_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Department> {
        let now = now_timestamp();

        let id = sqlx::query(
            r#"
            INSERT INTO departments (name, description, organization_id, admin_id, created_at, updated_at)
            VALUES (?, ?, ?, NULL, ?, ?)
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(organization_id)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await
        .context("Failed to create department")?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .context("Failed to retrieve created department")
    }

    pub async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Department>> {
        let Some(existing) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let name = name.map(str::to_string).unwrap_or(existing.name);
        let description = description.map(str::to_string).or(existing.description);

        sqlx::query(
            r#"
            UPDATE departments
            SET name = ?, description = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&name)
        .bind(&description)
        .bind(now_timestamp())
        .bind(id)
        .execute(self.pool)
        .await
        .context("Failed to update department")?;

        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .context("Failed to delete department")?;

        Ok(result.rows_affected() > 0)
    }

    /// Claim the admin slot for `user_id` and grant the `dept_admin` role
    ///
    /// Returns `false` without changing anything when the slot is already
    /// taken.
    pub async fn assign_admin(&self, department_id: i64, user_id: i64) -> Result<bool> {
        let now = now_timestamp();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let claimed = sqlx::query(
            "UPDATE departments SET admin_id = ?, updated_at = ? WHERE id = ? AND admin_id IS NULL",
        )
        .bind(user_id)
        .bind(&now)
        .bind(department_id)
        .execute(&mut *tx)
        .await
        .context("Failed to assign department admin")?
        .rows_affected();

        if claimed == 0 {
            tx.rollback().await.context("Failed to roll back admin assignment")?;
            return Ok(false);
        }

        sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(Role::DeptAdmin.as_str())
            .bind(&now)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to grant department admin role")?;

        tx.commit().await.context("Failed to commit admin assignment")?;
        Ok(true)
    }

    /// Clear the admin slot and reset `user_id` to the `user` role
    pub async fn remove_admin(&self, department_id: i64, user_id: i64) -> Result<()> {
        let now = now_timestamp();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("UPDATE departments SET admin_id = NULL, updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(department_id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear department admin")?;

        sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(Role::User.as_str())
            .bind(&now)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to reset user role")?;

        tx.commit().await.context("Failed to commit admin removal")?;
        Ok(())
    }

    /// Add a membership; returns `false` when it already existed
    pub async fn add_member(&self, department_id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO department_user (user_id, department_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(department_id)
        .bind(now_timestamp())
        .execute(self.pool)
        .await
        .context("Failed to add department member")?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn is_member(&self, department_id: i64, user_id: i64) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT user_id FROM department_user WHERE department_id = ? AND user_id = ?",
        )
        .bind(department_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to check department membership")?;

        Ok(found.is_some())
    }
}

fn row_to_department(row: DepartmentRow) -> Department {
    Department {
        id: row.id,
        name: row.name,
        description: row.description,
        organization_id: row.organization_id,
        admin_id: row.admin_id,
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    }
}
