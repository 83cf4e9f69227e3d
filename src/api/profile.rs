//! Profile of the authenticated account

use axum::{extract::State, routing::get, Json, Router};

use crate::{
    api::extract::ApiJson,
    middleware::AuthUser,
    models::{DataResponse, MessageResponse, UpdateProfileRequest, UserPublic},
    services::AuthService,
    utils::AppResult,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/profile",
        get(show_profile).put(update_profile).delete(delete_profile),
    )
}

async fn show_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<UserPublic>> {
    let user = AuthService::new(state.db.clone())
        .get_user(auth_user.id)
        .await?;
    Ok(Json(user.into()))
}

async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<UserPublic>>> {
    let user = AuthService::new(state.db.clone())
        .update_profile(auth_user.id, &payload, &state.config.auth)
        .await?;

    Ok(Json(DataResponse::with_message(
        "Profile updated successfully",
        user.into(),
    )))
}

/// Remove the account; tokens issued to it stop resolving
async fn delete_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<MessageResponse>> {
    AuthService::new(state.db.clone())
        .delete_account(auth_user.id)
        .await?;
    Ok(Json(MessageResponse::new("User profile deleted successfully")))
}
