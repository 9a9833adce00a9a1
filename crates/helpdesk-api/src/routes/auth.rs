//! Registration, login and the current user

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use helpdesk_core::User;

use crate::error::ApiError;
use crate::middleware::auth::Identity;
use crate::models::*;
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

fn signed_in(state: &ApiState, user: User) -> Result<AuthResponse, ApiError> {
    let token = state.tokens.issue(&user)?;
    Ok(AuthResponse { user: user.into(), token })
}

/// Register a client account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created; data holds the user and a token", body = AuthResponse),
        (status = 400, description = "Invalid name, email or password", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    let user = state.accounts.register(req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(signed_in(&state, user)?))))
}

/// Exchange credentials for a token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let user = state.accounts.authenticate(&req.email, &req.password).await?;
    tracing::info!(user_id = %user.id, "signed in");
    Ok(Json(ApiResponse::success(signed_in(&state, user)?)))
}

/// Current user
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "The authenticated user", body = UserView),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    tag = "auth",
    security(("bearer" = []))
)]
pub async fn me(
    State(state): State<Arc<ApiState>>,
    Identity(caller): Identity,
) -> Result<Json<ApiResponse<UserView>>, ApiError> {
    let user = state.accounts.get_user(caller.id()).await?;
    Ok(Json(ApiResponse::success(user.into())))
}
