//! Maintenance request endpoints

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};

use crate::{
    api::extract::{ApiJson, ApiPath, FormParts},
    middleware::AuthUser,
    models::{
        AssignMaintenanceRequest, DataResponse, MaintenanceRequestDetail,
        UpdateMaintenanceStatusRequest, UserPublic,
    },
    services::{MaintenanceForm, MaintenanceService},
    utils::AppResult,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/maintenance-requests",
            get(list_requests).post(create_request),
        )
        .route("/maintenance-requests/{id}/assign", post(assign_request))
        .route("/maintenance-requests/{id}/status", patch(update_status))
        .route("/maintenance-team", get(maintenance_team))
}

async fn create_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<MaintenanceRequestDetail>>)> {
    let mut parts = FormParts::read(multipart).await?;
    let form = MaintenanceForm {
        department_id: parts.text("department_id"),
        title: parts.text("title"),
        description: parts.text("description"),
        status: parts.text("status"),
        photos: parts.files("photos"),
    };

    let detail = MaintenanceService::new(&state)
        .create(&auth_user, form)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::with_message(
            "Maintenance request with photos created successfully.",
            detail,
        )),
    ))
}

async fn list_requests(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<MaintenanceRequestDetail>>>> {
    let requests = MaintenanceService::new(&state).list(&auth_user).await?;
    Ok(Json(DataResponse::new(requests)))
}

async fn maintenance_team(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<UserPublic>>>> {
    let team = MaintenanceService::new(&state).team().await?;
    Ok(Json(DataResponse::new(team)))
}

async fn assign_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<AssignMaintenanceRequest>,
) -> AppResult<Json<DataResponse<MaintenanceRequestDetail>>> {
    let detail = MaintenanceService::new(&state)
        .assign(&auth_user, id, &payload)
        .await?;
    Ok(Json(DataResponse::with_message(
        "Request assigned successfully.",
        detail,
    )))
}

async fn update_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateMaintenanceStatusRequest>,
) -> AppResult<Json<DataResponse<MaintenanceRequestDetail>>> {
    let detail = MaintenanceService::new(&state)
        .update_status(&auth_user, id, &payload)
        .await?;
    Ok(Json(DataResponse::with_message(
        "Status updated successfully.",
        detail,
    )))
}
