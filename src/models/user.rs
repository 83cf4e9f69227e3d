//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::validation::validate_not_blank;

/// The single role a user holds
///
/// Stored and serialized as `user`, `owner`, `dept_admin`, `maintenance`.
/// Both the listing scope and the request policy match on this enum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Owner,
    DeptAdmin,
    Maintenance,
}

impl Role {
    pub fn all() -> [Role; 4] {
        [Role::User, Role::Owner, Role::DeptAdmin, Role::Maintenance]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Owner => "owner",
            Role::DeptAdmin => "dept_admin",
            Role::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "owner" => Ok(Role::Owner),
            "dept_admin" => Ok(Role::DeptAdmin),
            "maintenance" => Ok(Role::Maintenance),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User without password hash for safe serialization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPublic {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone_number: user.phone_number,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        required(message = "The name field is required."),
        custom(function = "validate_not_blank", message = "The name field is required."),
        length(max = 255, message = "The name field must not be greater than 255 characters.")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address.")
    )]
    pub email: Option<String>,
    #[validate(required(message = "The password field is required."))]
    pub password: Option<String>,
    /// Kept as text so an unknown value becomes a field error instead of a parse failure
    #[validate(required(message = "The role field is required."))]
    pub role: Option<String>,
    #[validate(length(max = 20, message = "The phone number field must not be greater than 20 characters."))]
    pub phone_number: Option<String>,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Profile update; every field is optional
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(
        custom(function = "validate_not_blank", message = "The name field is required."),
        length(max = 255, message = "The name field must not be greater than 255 characters.")
    )]
    pub name: Option<String>,
    #[validate(email(message = "The email field must be a valid email address."))]
    pub email: Option<String>,
    #[validate(length(max = 20, message = "The phone number field must not be greater than 20 characters."))]
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

/// Login/registration response carrying the bearer token
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub status: bool,
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: UserPublic,
}
