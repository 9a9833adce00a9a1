//! Ticket comment thread

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use helpdesk_core::EntityId;

use crate::error::ApiError;
use crate::middleware::auth::Identity;
use crate::models::*;
use crate::routes::People;
use crate::ApiState;

/// Comments on a ticket, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}/comments",
    params(("id" = String, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Comment thread", body = [CommentView]),
        (status = 403, description = "Ticket belongs to another client", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse)
    ),
    tag = "comments",
    security(("bearer" = []))
)]
pub async fn list_comments(
    State(state): State<Arc<ApiState>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<CommentView>>>, ApiError> {
    let thread = state.tickets.list_comments(&caller, &EntityId::from_string(id)).await?;
    let views = People::new(state.accounts.as_ref()).comments(thread).await?;
    Ok(Json(ApiResponse::success(views)))
}

/// Add a comment. Agent replies notify the ticket owner.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{id}/comments",
    params(("id" = String, Path, description = "Ticket ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CommentView),
        (status = 400, description = "Empty or oversized message", body = ErrorResponse),
        (status = 403, description = "Ticket belongs to another client", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse)
    ),
    tag = "comments",
    security(("bearer" = []))
)]
pub async fn create_comment(
    State(state): State<Arc<ApiState>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CommentView>>), ApiError> {
    let comment = state.tickets.add_comment(&caller, &EntityId::from_string(id), req.into()).await?;
    let view = People::new(state.accounts.as_ref()).comment(comment).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(view))))
}
