//! Authentication API endpoints
//!
//! Provides login and registration; both issue a bearer token.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::{
    api::extract::ApiJson,
    middleware::auth::create_access_token,
    models::{AuthResponse, LoginRequest, RegisterRequest, User},
    services::AuthService,
    utils::AppError,
    AppState,
};

/// Create public routes for authentication endpoints (no auth required)
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
}

/// Body returned for rejected credentials
#[derive(Debug, Serialize)]
struct LoginFailure {
    status: bool,
    message: &'static str,
}

/// Login handler
///
/// POST /api/login
async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Response, AppError> {
    let auth_service = AuthService::new(state.db.clone());

    let user = auth_service
        .authenticate(&payload.email, &payload.password)
        .await
        .map_err(|e| {
            tracing::error!("Authentication failed: {:#}", e);
            AppError::internal("Authentication failed")
        })?;

    let Some(user) = user else {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(LoginFailure {
                status: false,
                message: "Wrong Email or Password",
            }),
        )
            .into_response());
    };

    let response = token_response(&state, user, Some("User logged in successfully"))?;
    Ok(Json(response).into_response())
}

/// Register a new account
///
/// POST /api/register
async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let auth_service = AuthService::new(state.db.clone());
    let user = auth_service.register(&payload, &state.config.auth).await?;

    let response = token_response(&state, user, None)?;
    Ok((StatusCode::CREATED, Json(response)))
}

fn token_response(
    state: &AppState,
    user: User,
    message: Option<&str>,
) -> Result<AuthResponse, AppError> {
    let token = create_access_token(
        user.id,
        &user.email,
        &state.config.auth.jwt_secret,
        state.config.auth.token_expiry_hours,
    )
    .map_err(|e| {
        tracing::error!("Failed to create access token: {}", e);
        AppError::internal("Failed to create access token")
    })?;

    Ok(AuthResponse {
        status: true,
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.auth.token_expiry_hours * 3600,
        message: message.map(str::to_string),
        data: user.into(),
    })
}
