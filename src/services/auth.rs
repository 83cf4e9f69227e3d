//! Authentication service
//!
//! Provides password hashing with Argon2, account registration, credential
//! checks and self-service profile changes.

use anyhow::Result;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use sqlx::SqlitePool;
use tracing::info;
use validator::Validate;

use crate::{
    config::AuthConfig,
    db::user_repository::{NewUser, UserChanges},
    db::UserRepository,
    models::{RegisterRequest, Role, UpdateProfileRequest, User},
    utils::{
        error::field_errors,
        validation::{invalid_selection_message, push_error, validate_phone_number},
        AppError, AppResult, FieldErrors,
    },
};

/// Authentication service for account management
pub struct AuthService {
    pool: SqlitePool,
}

impl AuthService {
    /// Create a new auth service
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Hash a password using Argon2id
    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();
        Ok(password_hash)
    }

    /// Verify a password against a hash
    pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Validate and create a new account
    pub async fn register(&self, req: &RegisterRequest, config: &AuthConfig) -> AppResult<User> {
        let repo = UserRepository::new(&self.pool);
        let mut errors = req.validate().err().map(|e| field_errors(&e)).unwrap_or_default();

        if let Some(password) = &req.password {
            check_password_length(&mut errors, password, config.password_min_length);
        }

        let role = match req.role.as_deref() {
            Some(value) => match value.parse::<Role>() {
                Ok(role) => Some(role),
                Err(_) => {
                    push_error(&mut errors, "role", invalid_selection_message("role"));
                    None
                }
            },
            None => None,
        };

        if let Some(phone) = &req.phone_number {
            check_phone(&mut errors, phone);
        }

        if let Some(email) = &req.email {
            if !errors.contains_key("email") && repo.email_taken(email, None).await? {
                push_error(&mut errors, "email", "The email has already been taken.");
            }
        }

        let (Some(name), Some(email), Some(password), Some(role)) =
            (&req.name, &req.email, &req.password, role)
        else {
            return Err(AppError::validation(errors));
        };
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }

        let password_hash = Self::hash_password(password)?;
        let user = repo
            .create(&NewUser {
                name: name.trim(),
                email,
                password_hash: &password_hash,
                phone_number: req.phone_number.as_deref(),
                role,
            })
            .await?;

        info!(user_id = user.id, role = %user.role, "Account registered");
        Ok(user)
    }

    /// Check credentials; `None` when the email is unknown or the password is wrong
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = UserRepository::new(&self.pool).get_by_email(email).await? else {
            return Ok(None);
        };

        if Self::verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub async fn get_user(&self, id: i64) -> AppResult<User> {
        UserRepository::new(&self.pool)
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Apply a partial profile update
    pub async fn update_profile(
        &self,
        user_id: i64,
        req: &UpdateProfileRequest,
        config: &AuthConfig,
    ) -> AppResult<User> {
        let repo = UserRepository::new(&self.pool);
        let mut errors = req.validate().err().map(|e| field_errors(&e)).unwrap_or_default();

        if let Some(email) = &req.email {
            if !errors.contains_key("email") && repo.email_taken(email, Some(user_id)).await? {
                push_error(&mut errors, "email", "The email has already been taken.");
            }
        }

        if let Some(phone) = &req.phone_number {
            check_phone(&mut errors, phone);
        }

        if let Some(password) = &req.password {
            check_password_length(&mut errors, password, config.password_min_length);
            if req.password_confirmation.as_deref() != Some(password.as_str()) {
                push_error(
                    &mut errors,
                    "password",
                    "The password field confirmation does not match.",
                );
            }
        }

        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }

        let password_hash = req
            .password
            .as_deref()
            .map(Self::hash_password)
            .transpose()?;

        let changes = UserChanges {
            name: req.name.as_deref().map(|n| n.trim().to_string()),
            email: req.email.clone(),
            phone_number: req.phone_number.clone(),
            password_hash,
        };

        repo.update(user_id, &changes)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    pub async fn delete_account(&self, user_id: i64) -> AppResult<()> {
        if !UserRepository::new(&self.pool).delete(user_id).await? {
            return Err(AppError::not_found("User not found"));
        }
        info!(user_id, "Account deleted");
        Ok(())
    }
}

fn check_password_length(errors: &mut FieldErrors, password: &str, min: usize) {
    if password.chars().count() < min {
        push_error(
            errors,
            "password",
            format!("The password field must be at least {} characters.", min),
        );
    }
}

fn check_phone(errors: &mut FieldErrors, phone: &str) {
    if !errors.contains_key("phone_number") && !validate_phone_number(phone) {
        push_error(errors, "phone_number", "The phone number field format is invalid.");
    }
}
