//! Business logic services

pub mod auth;
pub mod departments;
pub mod maintenance;
pub mod membership;
pub mod organizations;
pub mod policy;
pub mod storage;

pub use auth::AuthService;
pub use departments::DepartmentService;
pub use maintenance::{MaintenanceForm, MaintenanceService};
pub use membership::MembershipService;
pub use organizations::{OrganizationForm, OrganizationService};
pub use policy::Visibility;
pub use storage::{BlobStore, ImageKind, LocalBlobStore, UploadedFile};
