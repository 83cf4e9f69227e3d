//! Organization join request model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Organization, UserPublic};

/// `pending` moves to `approved` or `declined`; both are terminal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum JoinRequestStatus {
    #[default]
    Pending,
    Approved,
    Declined,
}

impl JoinRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinRequestStatus::Pending => "pending",
            JoinRequestStatus::Approved => "approved",
            JoinRequestStatus::Declined => "declined",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JoinRequestStatus::Pending)
    }
}

impl std::fmt::Display for JoinRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JoinRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JoinRequestStatus::Pending),
            "approved" => Ok(JoinRequestStatus::Approved),
            "declined" => Ok(JoinRequestStatus::Declined),
            _ => Err(format!("Invalid join request status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinRequest {
    pub id: i64,
    pub user_id: i64,
    pub organization_id: i64,
    pub status: JoinRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A request as its author sees it
#[derive(Debug, Clone, Serialize)]
pub struct JoinRequestWithOrganization {
    #[serde(flatten)]
    pub request: JoinRequest,
    pub organization: Option<Organization>,
}

/// A request as the organization owner sees it
#[derive(Debug, Clone, Serialize)]
pub struct JoinRequestWithUser {
    #[serde(flatten)]
    pub request: JoinRequest,
    pub user: Option<UserPublic>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitJoinRequest {
    pub organization_id: Option<i64>,
}
