//! Authorization rules for organizations and maintenance requests
//!
//! Every rule keys off the caller's single [`Role`]. The listing scope and
//! `can_view` come from the same match, so a row is listed exactly when the
//! caller may view it (owners aside, who list everything but are never
//! granted by the per-row predicates).

use crate::{
    db::MaintenanceFilter,
    middleware::AuthUser,
    models::{Department, MaintenanceRequest, Organization, Role},
};

/// Which maintenance requests a caller may list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    OwnRequests(i64),
    AdministeredDepartments(i64),
    AssignedTo(i64),
    Unrestricted,
}

impl Visibility {
    pub fn for_user(user: &AuthUser) -> Self {
        match user.role {
            Role::User => Visibility::OwnRequests(user.id),
            Role::DeptAdmin => Visibility::AdministeredDepartments(user.id),
            Role::Maintenance => Visibility::AssignedTo(user.id),
            Role::Owner => Visibility::Unrestricted,
        }
    }

    pub fn filter(self) -> MaintenanceFilter {
        match self {
            Visibility::OwnRequests(id) => MaintenanceFilter::CreatedBy(id),
            Visibility::AdministeredDepartments(id) => MaintenanceFilter::AdministeredBy(id),
            Visibility::AssignedTo(id) => MaintenanceFilter::AssignedTo(id),
            Visibility::Unrestricted => MaintenanceFilter::All,
        }
    }

    /// Whether a request falls inside this scope
    pub fn admits(&self, request: &MaintenanceRequest, department: &Department) -> bool {
        match *self {
            Visibility::OwnRequests(id) => request.user_id == id,
            Visibility::AdministeredDepartments(id) => department.admin_id == Some(id),
            Visibility::AssignedTo(id) => request.assigned_to == Some(id),
            Visibility::Unrestricted => true,
        }
    }
}

/// View rule: creator, department admin or assignee, by role
pub fn can_view(user: &AuthUser, request: &MaintenanceRequest, department: &Department) -> bool {
    match Visibility::for_user(user) {
        Visibility::Unrestricted => false,
        scope => scope.admits(request, department),
    }
}

/// Update rule (assignment and status): department admin or assignee, by role
pub fn can_update(user: &AuthUser, request: &MaintenanceRequest, department: &Department) -> bool {
    match user.role {
        Role::DeptAdmin => department.admin_id == Some(user.id),
        Role::Maintenance => request.assigned_to == Some(user.id),
        Role::User | Role::Owner => false,
    }
}

pub fn owns_organization(user: &AuthUser, organization: &Organization) -> bool {
    organization.is_owned_by(user.id)
}
