//! Department management, admin assignment and membership

use sqlx::SqlitePool;
use tracing::info;
use validator::Validate;

use crate::{
    db::{DepartmentRepository, OrganizationRepository, UserRepository},
    middleware::AuthUser,
    models::{
        AdminAssignment, CreateDepartmentRequest, Department, DepartmentAdminRequest,
        DepartmentMemberRequest, DepartmentUser, Organization, UpdateDepartmentRequest, User,
    },
    services::policy,
    utils::{
        validation::{invalid_selection_message, push_error, required_message},
        AppError, AppResult, FieldErrors,
    },
};

const NOT_OWNER: &str = "Unauthorized you should be the owner";
const NOT_OWNER_ADMINS: &str = "Unauthorized: only the organization owner can manage admins";

pub struct DepartmentService {
    pool: SqlitePool,
}

impl DepartmentService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user: &AuthUser,
        req: &CreateDepartmentRequest,
    ) -> AppResult<Department> {
        req.validate()?;
        let (Some(name), Some(organization_id)) = (&req.name, req.organization_id) else {
            return Err(AppError::invalid_field("name", required_message("name")));
        };

        let organization = OrganizationRepository::new(&self.pool)
            .get_by_id(organization_id)
            .await?
            .ok_or_else(|| {
                AppError::invalid_field(
                    "organization_id",
                    invalid_selection_message("organization_id"),
                )
            })?;

        if !policy::owns_organization(user, &organization) {
            return Err(AppError::forbidden(NOT_OWNER));
        }

        let department = DepartmentRepository::new(&self.pool)
            .create(organization.id, name.trim(), req.description.as_deref())
            .await?;

        info!(
            department_id = department.id,
            organization_id = organization.id,
            "Department created"
        );
        Ok(department)
    }

    pub async fn list_for_organization(&self, organization_id: i64) -> AppResult<Vec<Department>> {
        Ok(DepartmentRepository::new(&self.pool)
            .list_by_organization(organization_id)
            .await?)
    }

    pub async fn update(
        &self,
        user: &AuthUser,
        department_id: i64,
        req: &UpdateDepartmentRequest,
    ) -> AppResult<Department> {
        let department = self.owned_department(user, department_id, NOT_OWNER).await?;
        req.validate()?;

        DepartmentRepository::new(&self.pool)
            .update(department.id, req.name.as_deref().map(str::trim), req.description.as_deref())
            .await?
            .ok_or_else(|| AppError::not_found("Department not found"))
    }

    pub async fn delete(&self, user: &AuthUser, department_id: i64) -> AppResult<()> {
        let department = self.owned_department(user, department_id, NOT_OWNER).await?;

        DepartmentRepository::new(&self.pool)
            .delete(department.id)
            .await?;

        info!(department_id, "Department deleted");
        Ok(())
    }

    /// Give a department its admin and grant that user the `dept_admin` role
    ///
    /// An occupied slot is a conflict even when the requested user differs
    /// from the current admin.
    pub async fn assign_admin(
        &self,
        user: &AuthUser,
        req: &DepartmentAdminRequest,
    ) -> AppResult<AdminAssignment> {
        let (department_id, user_id) = require_admin_pair(req)?;
        let repo = DepartmentRepository::new(&self.pool);

        let department = self.department(department_id).await?;
        if department.has_admin() {
            return Err(already_administered());
        }
        self.require_owner(user, &department, NOT_OWNER_ADMINS).await?;
        let target = self.target_user(user_id).await?;

        if !repo.assign_admin(department.id, target.id).await? {
            return Err(already_administered());
        }

        info!(
            department_id,
            admin_id = target.id,
            assigned_by = user.id,
            "Department admin assigned"
        );
        self.assignment(department_id, target.id).await
    }

    /// Clear a department's admin and reset that user to the `user` role
    pub async fn remove_admin(
        &self,
        user: &AuthUser,
        req: &DepartmentAdminRequest,
    ) -> AppResult<AdminAssignment> {
        let (department_id, user_id) = require_admin_pair(req)?;

        let department = self.department(department_id).await?;
        self.require_owner(user, &department, NOT_OWNER_ADMINS).await?;
        let target = self.target_user(user_id).await?;

        DepartmentRepository::new(&self.pool)
            .remove_admin(department.id, target.id)
            .await?;

        info!(
            department_id,
            admin_id = target.id,
            removed_by = user.id,
            "Department admin removed"
        );
        self.assignment(department_id, target.id).await
    }

    /// Add a user to a department; repeating it is a no-op
    pub async fn add_member(&self, req: &DepartmentMemberRequest) -> AppResult<DepartmentUser> {
        let mut errors = FieldErrors::new();

        let user_exists = match req.user_id {
            Some(id) => UserRepository::new(&self.pool).exists(id).await?,
            None => false,
        };
        let department_exists = match req.department_id {
            Some(id) => DepartmentRepository::new(&self.pool)
                .get_by_id(id)
                .await?
                .is_some(),
            None => false,
        };

        check_reference(&mut errors, "user_id", req.user_id, user_exists);
        check_reference(&mut errors, "department_id", req.department_id, department_exists);

        let (Some(user_id), Some(department_id)) = (req.user_id, req.department_id) else {
            return Err(AppError::validation(errors));
        };
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }

        let added = DepartmentRepository::new(&self.pool)
            .add_member(department_id, user_id)
            .await?;
        if added {
            info!(department_id, user_id, "User added to department");
        }

        Ok(DepartmentUser {
            user_id,
            department_id,
        })
    }

    async fn department(&self, department_id: i64) -> AppResult<Department> {
        DepartmentRepository::new(&self.pool)
            .get_by_id(department_id)
            .await?
            .ok_or_else(|| AppError::not_found("Department not found"))
    }

    async fn organization_of(&self, department: &Department) -> AppResult<Option<Organization>> {
        Ok(OrganizationRepository::new(&self.pool)
            .get_by_id(department.organization_id)
            .await?)
    }

    async fn require_owner(
        &self,
        user: &AuthUser,
        department: &Department,
        message: &str,
    ) -> AppResult<()> {
        let owns = self
            .organization_of(department)
            .await?
            .is_some_and(|org| policy::owns_organization(user, &org));
        if owns {
            Ok(())
        } else {
            Err(AppError::forbidden(message))
        }
    }

    async fn owned_department(
        &self,
        user: &AuthUser,
        department_id: i64,
        message: &str,
    ) -> AppResult<Department> {
        let department = self.department(department_id).await?;
        self.require_owner(user, &department, message).await?;
        Ok(department)
    }

    async fn target_user(&self, user_id: i64) -> AppResult<User> {
        UserRepository::new(&self.pool)
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    async fn assignment(&self, department_id: i64, user_id: i64) -> AppResult<AdminAssignment> {
        let department = self.department(department_id).await?;
        let admin_user = self.target_user(user_id).await?;
        Ok(AdminAssignment {
            department,
            admin_user: admin_user.into(),
        })
    }
}

fn require_admin_pair(req: &DepartmentAdminRequest) -> AppResult<(i64, i64)> {
    match (req.department_id, req.user_id) {
        (Some(department_id), Some(user_id)) => Ok((department_id, user_id)),
        _ => {
            let message = "Both department_id and user_id are required";
            let mut errors = FieldErrors::new();
            if req.department_id.is_none() {
                push_error(&mut errors, "department_id", message);
            }
            if req.user_id.is_none() {
                push_error(&mut errors, "user_id", message);
            }
            Err(AppError::ValidationFailed {
                message: message.to_string(),
                errors,
            })
        }
    }
}

/// `required|exists` style check on an id field
fn check_reference(errors: &mut FieldErrors, field: &str, value: Option<i64>, exists: bool) {
    match value {
        None => push_error(errors, field, required_message(field)),
        Some(_) if !exists => push_error(errors, field, invalid_selection_message(field)),
        Some(_) => {}
    }
}

fn already_administered() -> AppError {
    AppError::conflict("This department already has an admin assigned.")
}
