//! Organization API endpoints

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::{
    api::extract::{ApiPath, FormParts},
    middleware::AuthUser,
    models::{DataResponse, MessageResponse, Organization},
    services::{OrganizationForm, OrganizationService},
    utils::AppResult,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/organizations", post(create_organization))
        // POST doubles as update for multipart clients that spoof the method
        .route(
            "/organizations/{id}",
            post(update_organization)
                .put(update_organization)
                .delete(delete_organization),
        )
        .route("/myorganizations", get(my_organizations))
        .route("/getAllOrganizations", get(list_organizations))
}

async fn read_form(multipart: Multipart) -> AppResult<OrganizationForm> {
    let mut parts = FormParts::read(multipart).await?;
    Ok(OrganizationForm {
        name: parts.text("name"),
        description: parts.text("description"),
        photo: parts.file("photo"),
    })
}

async fn create_organization(
    State(state): State<AppState>,
    auth_user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Organization>>)> {
    let form = read_form(multipart).await?;
    let organization = OrganizationService::new(&state)
        .create(&auth_user, form)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::with_message(
            "Organization created successfully",
            organization,
        )),
    ))
}

async fn list_organizations(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Organization>>>> {
    let organizations = OrganizationService::new(&state).list_all().await?;
    Ok(Json(DataResponse::new(organizations)))
}

async fn my_organizations(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Organization>>>> {
    let organizations = OrganizationService::new(&state).mine(&auth_user).await?;
    Ok(Json(DataResponse::new(organizations)))
}

async fn update_organization(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<Organization>>> {
    let form = read_form(multipart).await?;
    let organization = OrganizationService::new(&state)
        .update(&auth_user, id, form)
        .await?;

    Ok(Json(DataResponse::with_message(
        "Organization updated successfully",
        organization,
    )))
}

async fn delete_organization(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<MessageResponse>> {
    OrganizationService::new(&state)
        .delete(&auth_user, id)
        .await?;
    Ok(Json(MessageResponse::new("Organization deleted successfully")))
}
