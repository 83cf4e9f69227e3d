//! Organization join-request endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};

use crate::{
    api::extract::{ApiJson, ApiPath},
    middleware::AuthUser,
    models::{
        DataResponse, JoinRequest, JoinRequestStatus, JoinRequestWithOrganization,
        JoinRequestWithUser, MessageResponse, SubmitJoinRequest,
    },
    services::MembershipService,
    utils::AppResult,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/MakeRequestToOrganization", post(submit_request))
        .route("/ShowAllMyRequests", get(my_requests))
        .route("/CancelMyRequest/{id}", delete(cancel_request))
        .route("/getRequestsForOrganization/{id}", get(organization_requests))
        .route("/getUsersOfOrganization/{id}", get(organization_members))
        .route("/acceptRequest/{id}", put(accept_request))
        .route("/declineRequest/{id}", put(decline_request))
}

async fn submit_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiJson(payload): ApiJson<SubmitJoinRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<JoinRequest>>)> {
    let request = MembershipService::new(state.db.clone())
        .submit(&auth_user, payload.organization_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::with_message("Request sent successfully.", request)),
    ))
}

async fn my_requests(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<JoinRequestWithOrganization>>>> {
    let requests = MembershipService::new(state.db.clone())
        .my_requests(&auth_user)
        .await?;
    Ok(Json(DataResponse::new(requests)))
}

async fn cancel_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<MessageResponse>> {
    MembershipService::new(state.db.clone())
        .cancel(&auth_user, id)
        .await?;
    Ok(Json(MessageResponse::new("Request cancelled.")))
}

async fn organization_requests(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiPath(organization_id): ApiPath<i64>,
) -> AppResult<Json<DataResponse<Vec<JoinRequestWithUser>>>> {
    let requests = MembershipService::new(state.db.clone())
        .pending_for_organization(&auth_user, organization_id)
        .await?;
    Ok(Json(DataResponse::new(requests)))
}

async fn organization_members(
    State(state): State<AppState>,
    ApiPath(organization_id): ApiPath<i64>,
) -> AppResult<Json<DataResponse<Vec<JoinRequestWithUser>>>> {
    let members = MembershipService::new(state.db.clone())
        .members_of_organization(organization_id)
        .await?;
    Ok(Json(DataResponse::new(members)))
}

async fn accept_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<DataResponse<JoinRequest>>> {
    let request = MembershipService::new(state.db.clone())
        .decide(&auth_user, id, JoinRequestStatus::Approved)
        .await?;
    Ok(Json(DataResponse::with_message("Request approved.", request)))
}

async fn decline_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<DataResponse<JoinRequest>>> {
    let request = MembershipService::new(state.db.clone())
        .decide(&auth_user, id, JoinRequestStatus::Declined)
        .await?;
    Ok(Json(DataResponse::with_message("Request declined.", request)))
}
