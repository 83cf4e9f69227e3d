//! Maintenance request model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Department, UserPublic};

/// Ticket status
///
/// There is no transition graph; an authorized actor may set any value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MaintenanceStatus {
    #[default]
    New,
    Declined,
    Pending,
    InProgress,
    Done,
    Trashed,
}

impl MaintenanceStatus {
    pub fn all() -> [MaintenanceStatus; 6] {
        [
            MaintenanceStatus::New,
            MaintenanceStatus::Declined,
            MaintenanceStatus::Pending,
            MaintenanceStatus::InProgress,
            MaintenanceStatus::Done,
            MaintenanceStatus::Trashed,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceStatus::New => "new",
            MaintenanceStatus::Declined => "declined",
            MaintenanceStatus::Pending => "pending",
            MaintenanceStatus::InProgress => "in-progress",
            MaintenanceStatus::Done => "done",
            MaintenanceStatus::Trashed => "trashed",
        }
    }
}

impl std::fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MaintenanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MaintenanceStatus::all()
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid maintenance status: {}", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaintenanceRequest {
    pub id: i64,
    pub user_id: i64,
    pub department_id: i64,
    pub assigned_to: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub status: MaintenanceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Photo {
    pub id: i64,
    pub maintenance_request_id: i64,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A request with its creator, department, assignee and photos loaded
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceRequestDetail {
    #[serde(flatten)]
    pub request: MaintenanceRequest,
    pub user: Option<UserPublic>,
    pub department: Option<Department>,
    pub assignee: Option<UserPublic>,
    pub photos: Vec<Photo>,
}

/// Validated fields for a new request, photos handled separately
#[derive(Debug, Clone)]
pub struct NewMaintenanceRequest {
    pub user_id: i64,
    pub department_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: MaintenanceStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignMaintenanceRequest {
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMaintenanceStatusRequest {
    pub status: Option<String>,
}
