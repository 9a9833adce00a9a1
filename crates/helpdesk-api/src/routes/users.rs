//! User directory

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use helpdesk_core::domain::policy::Violations;
use helpdesk_core::Role;
use serde::Deserialize;

use crate::error::ApiError;
use crate::middleware::auth::Identity;
use crate::models::*;
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new().route("/", get(list_users))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    role: Option<String>,
}

/// List users, optionally by role
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(
        ("role" = Option<String>, Query, description = "Filter by role: client or agent")
    ),
    responses(
        (status = 200, description = "Users sorted by name", body = [UserView]),
        (status = 400, description = "Unknown role", body = ErrorResponse)
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn list_users(
    State(state): State<Arc<ApiState>>,
    Identity(_caller): Identity,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<UserView>>>, ApiError> {
    let role = match params.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => Some(role),
            Err(_) => {
                let mut violations = Violations::default();
                violations.push("role", "must be one of client, agent");
                violations.finish()?;
                None
            }
        },
        None => None,
    };

    let users = state.accounts.list_users(role).await?;
    Ok(Json(ApiResponse::success(users.into_iter().map(UserView::from).collect())))
}
