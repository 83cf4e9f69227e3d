//! Organization join-request workflow
//!
//! A user asks to join an organization; its owner approves or declines.
//! Approval does not place the user in any department.

use sqlx::SqlitePool;
use tracing::info;

use crate::{
    db::{JoinRequestRepository, OrganizationRepository, UserRepository},
    middleware::AuthUser,
    models::{
        JoinRequest, JoinRequestStatus, JoinRequestWithOrganization, JoinRequestWithUser,
        Organization, UserPublic,
    },
    services::policy,
    utils::{error::is_unique_violation, validation::required_message, AppError, AppResult},
};

const DUPLICATE_REQUEST: &str = "Request already exists.";
const ALREADY_DECIDED: &str = "Request has already been decided.";

pub struct MembershipService {
    pool: SqlitePool,
}

impl MembershipService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Submit a `pending` request to join an organization
    pub async fn submit(
        &self,
        user: &AuthUser,
        organization_id: Option<i64>,
    ) -> AppResult<JoinRequest> {
        let organization_id = organization_id.ok_or_else(|| {
            AppError::invalid_field("organization_id", required_message("organization_id"))
        })?;

        OrganizationRepository::new(&self.pool)
            .get_by_id(organization_id)
            .await?
            .ok_or_else(|| AppError::not_found("Organization not found."))?;

        let repo = JoinRequestRepository::new(&self.pool);
        if repo.find_for_pair(user.id, organization_id).await?.is_some() {
            return Err(AppError::conflict(DUPLICATE_REQUEST));
        }

        // The UNIQUE(user_id, organization_id) constraint settles concurrent submits
        let request = repo
            .create(user.id, organization_id)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::conflict(DUPLICATE_REQUEST)
                } else {
                    AppError::from(e)
                }
            })?;

        info!(
            request_id = request.id,
            user_id = user.id,
            organization_id,
            "Join request submitted"
        );
        Ok(request)
    }

    /// Every request of the caller with its organization attached
    pub async fn my_requests(&self, user: &AuthUser) -> AppResult<Vec<JoinRequestWithOrganization>> {
        let requests = JoinRequestRepository::new(&self.pool)
            .list_by_user(user.id)
            .await?;

        let org_ids: Vec<i64> = requests.iter().map(|r| r.organization_id).collect();
        let orgs = OrganizationRepository::new(&self.pool)
            .get_many(&org_ids)
            .await?;

        Ok(requests
            .into_iter()
            .map(|request| JoinRequestWithOrganization {
                organization: orgs.get(&request.organization_id).cloned(),
                request,
            })
            .collect())
    }

    /// Withdraw a request; only the requester may, and only while pending
    pub async fn cancel(&self, user: &AuthUser, request_id: i64) -> AppResult<()> {
        let deleted = JoinRequestRepository::new(&self.pool)
            .delete_pending(request_id, user.id)
            .await?;

        if !deleted {
            return Err(AppError::not_found("Request not found or cannot be cancelled."));
        }

        info!(request_id, user_id = user.id, "Join request cancelled");
        Ok(())
    }

    /// Pending requests of an organization, for its owner
    pub async fn pending_for_organization(
        &self,
        user: &AuthUser,
        organization_id: i64,
    ) -> AppResult<Vec<JoinRequestWithUser>> {
        let organization = self.organization(organization_id).await?;
        if !policy::owns_organization(user, &organization) {
            return Err(AppError::forbidden("Unauthorized"));
        }

        self.with_users(organization_id, JoinRequestStatus::Pending)
            .await
    }

    /// Approved requests of an organization, each with its user
    ///
    /// Any authenticated caller may list them; an unknown organization has
    /// no members.
    pub async fn members_of_organization(
        &self,
        organization_id: i64,
    ) -> AppResult<Vec<JoinRequestWithUser>> {
        self.with_users(organization_id, JoinRequestStatus::Approved)
            .await
    }

    /// Approve or decline a pending request as the organization owner
    pub async fn decide(
        &self,
        user: &AuthUser,
        request_id: i64,
        decision: JoinRequestStatus,
    ) -> AppResult<JoinRequest> {
        let repo = JoinRequestRepository::new(&self.pool);
        let request = repo
            .get_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Request not found."))?;

        let owns = OrganizationRepository::new(&self.pool)
            .get_by_id(request.organization_id)
            .await?
            .is_some_and(|org| policy::owns_organization(user, &org));
        if !owns {
            return Err(AppError::forbidden("Unauthorized"));
        }

        if request.status.is_terminal() {
            return Err(AppError::conflict(ALREADY_DECIDED));
        }

        let updated = repo
            .decide_pending(request_id, decision)
            .await?
            .ok_or_else(|| AppError::conflict(ALREADY_DECIDED))?;

        info!(
            request_id,
            organization_id = updated.organization_id,
            status = %decision,
            "Join request decided"
        );
        Ok(updated)
    }

    async fn organization(&self, organization_id: i64) -> AppResult<Organization> {
        OrganizationRepository::new(&self.pool)
            .get_by_id(organization_id)
            .await?
            .ok_or_else(|| AppError::not_found("Organization not found."))
    }

    async fn with_users(
        &self,
        organization_id: i64,
        status: JoinRequestStatus,
    ) -> AppResult<Vec<JoinRequestWithUser>> {
        let requests = JoinRequestRepository::new(&self.pool)
            .list_by_organization(organization_id, status)
            .await?;

        let user_ids: Vec<i64> = requests.iter().map(|r| r.user_id).collect();
        let users = UserRepository::new(&self.pool).get_many(&user_ids).await?;

        Ok(requests
            .into_iter()
            .map(|request| JoinRequestWithUser {
                user: users.get(&request.user_id).cloned().map(UserPublic::from),
                request,
            })
            .collect())
    }
}
