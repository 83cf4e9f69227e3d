//! Department model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::validation::validate_not_blank;

/// A department within one organization, with at most one admin
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub organization_id: i64,
    pub admin_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Department {
    pub fn has_admin(&self) -> bool {
        self.admin_id.is_some()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDepartmentRequest {
    #[validate(
        required(message = "The name field is required."),
        custom(function = "validate_not_blank", message = "The name field is required."),
        length(max = 255, message = "The name field must not be greater than 255 characters.")
    )]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(required(message = "The organization id field is required."))]
    pub organization_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateDepartmentRequest {
    #[validate(
        custom(function = "validate_not_blank", message = "The name field is required."),
        length(max = 255, message = "The name field must not be greater than 255 characters.")
    )]
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Body of `AssignAdmins` / `RemoveAdmins`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentAdminRequest {
    pub department_id: Option<i64>,
    pub user_id: Option<i64>,
}

/// Body of `assign-user-department`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentMemberRequest {
    pub user_id: Option<i64>,
    pub department_id: Option<i64>,
}

/// Membership row of the department/user pivot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DepartmentUser {
    pub user_id: i64,
    pub department_id: i64,
}

/// Result of assigning or removing a department admin
#[derive(Debug, Clone, Serialize)]
pub struct AdminAssignment {
    pub department: Department,
    pub admin_user: super::UserPublic,
}
