//! User repository

use std::collections::HashMap;

use anyhow::{Context, Result};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{now_timestamp, parse_db_timestamp};
use crate::models::{Role, User};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    phone_number: Option<String>,
    role: String,
    created_at: String,
    updated_at: String,
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, phone_number, role, created_at, updated_at";

/// Fields for a new account
#[derive(Debug, Clone)]
pub struct NewUser<'r> {
    pub name: &'r str,
    pub email: &'r str,
    pub password_hash: &'r str,
    pub phone_number: Option<&'r str>,
    pub role: Role,
}

/// Partial profile changes; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password_hash: Option<String>,
}

pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to get user")?;

        Ok(row.map(row_to_user))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await
        .context("Failed to get user by email")?;

        Ok(row.map(row_to_user))
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .context("Failed to check user")?;

        Ok(found.is_some())
    }

    /// Whether another account already uses `email`
    pub async fn email_taken(&self, email: &str, except_id: Option<i64>) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE email = ? AND id != ?")
                .bind(email)
                .bind(except_id.unwrap_or(0))
                .fetch_optional(self.pool)
                .await
                .context("Failed to check email uniqueness")?;

        Ok(found.is_some())
    }

    pub async fn create(&self, new_user: &NewUser<'_>) -> Result<User> {
        let now = now_timestamp();

        let id = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, phone_number, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new_user.name)
        .bind(new_user.email)
        .bind(new_user.password_hash)
        .bind(new_user.phone_number)
        .bind(new_user.role.as_str())
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await
        .context("Failed to create user")?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .context("Failed to retrieve created user")
    }

    pub async fn update(&self, id: i64, changes: &UserChanges) -> Result<Option<User>> {
        let Some(existing) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let name = changes.name.clone().unwrap_or(existing.name);
        let email = changes.email.clone().unwrap_or(existing.email);
        let phone_number = changes.phone_number.clone().or(existing.phone_number);
        let password_hash = changes
            .password_hash
            .clone()
            .unwrap_or(existing.password_hash);

        sqlx::query(
            r#"
            UPDATE users
            SET name = ?, email = ?, phone_number = ?, password_hash = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&name)
        .bind(&email)
        .bind(&phone_number)
        .bind(&password_hash)
        .bind(now_timestamp())
        .bind(id)
        .execute(self.pool)
        .await
        .context("Failed to update user")?;

        self.get_by_id(id).await
    }

    pub async fn set_role(&self, id: i64, role: Role) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(now_timestamp())
            .bind(id)
            .execute(self.pool)
            .await
            .context("Failed to update user role")?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_by_role(&self, role: Role) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE role = ? ORDER BY name",
            USER_COLUMNS
        ))
        .bind(role.as_str())
        .fetch_all(self.pool)
        .await
        .context("Failed to list users by role")?;

        Ok(rows.into_iter().map(row_to_user).collect())
    }

    /// Load several users at once, keyed by id
    pub async fn get_many(&self, ids: &[i64]) -> Result<HashMap<i64, User>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM users WHERE id IN (", USER_COLUMNS));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = builder
            .build_query_as::<UserRow>()
            .fetch_all(self.pool)
            .await
            .context("Failed to load users")?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let user = row_to_user(row);
                (user.id, user)
            })
            .collect())
    }
}

fn row_to_user(row: UserRow) -> User {
    User {
        id: row.id,
        name: row.name,
        email: row.email,
        password_hash: row.password_hash,
        phone_number: row.phone_number,
        role: row.role.parse().unwrap_or_default(),
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    }
}
