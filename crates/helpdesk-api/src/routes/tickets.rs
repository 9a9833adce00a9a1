//! Ticket endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use helpdesk_core::application::dto::ListTicketsQuery;
use helpdesk_core::EntityId;

use crate::error::ApiError;
use crate::middleware::auth::Identity;
use crate::models::*;
use crate::routes::{comments, People};
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_tickets).post(create_ticket))
        .route("/:id", get(get_ticket).put(update_ticket).delete(delete_ticket))
        .route("/:id/comments", get(comments::list_comments).post(comments::create_comment))
}

/// List tickets visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    params(
        ("status" = Option<String>, Query, description = "open, in-progress, resolved or closed"),
        ("priority" = Option<String>, Query, description = "low, medium, high or urgent")
    ),
    responses(
        (status = 200, description = "Tickets, newest first. Clients only see their own.", body = [TicketView]),
        (status = 400, description = "Unknown filter value", body = ErrorResponse)
    ),
    tag = "tickets",
    security(("bearer" = []))
)]
pub async fn list_tickets(
    State(state): State<Arc<ApiState>>,
    Identity(caller): Identity,
    Query(query): Query<ListTicketsQuery>,
) -> Result<Json<ApiResponse<Vec<TicketView>>>, ApiError> {
    let tickets = state.tickets.list_tickets(&caller, query).await?;
    let views = People::new(state.accounts.as_ref()).tickets(tickets).await?;
    Ok(Json(ApiResponse::success(views)))
}

/// Open a ticket owned by the caller
#[utoipa::path(
    post,
    path = "/api/v1/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created", body = TicketView),
        (status = 400, description = "Invalid title, description or priority", body = ErrorResponse)
    ),
    tag = "tickets",
    security(("bearer" = []))
)]
pub async fn create_ticket(
    State(state): State<Arc<ApiState>>,
    Identity(caller): Identity,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TicketView>>), ApiError> {
    let ticket = state.tickets.create_ticket(&caller, req.into()).await?;
    let view = People::new(state.accounts.as_ref()).ticket(ticket).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(view))))
}

/// Get ticket by ID
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}",
    params(("id" = String, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket details", body = TicketView),
        (status = 403, description = "Ticket belongs to another client", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse)
    ),
    tag = "tickets",
    security(("bearer" = []))
)]
pub async fn get_ticket(
    State(state): State<Arc<ApiState>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TicketView>>, ApiError> {
    let ticket = state.tickets.get_ticket(&caller, &EntityId::from_string(id)).await?;
    let view = People::new(state.accounts.as_ref()).ticket(ticket).await?;
    Ok(Json(ApiResponse::success(view)))
}

/// Update a ticket
#[utoipa::path(
    put,
    path = "/api/v1/tickets/{id}",
    params(("id" = String, Path, description = "Ticket ID")),
    request_body = UpdateTicketRequest,
    responses(
        (status = 200, description = "Updated ticket", body = TicketView),
        (status = 400, description = "Invalid field values", body = ErrorResponse),
        (status = 403, description = "Ticket belongs to another client", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse)
    ),
    tag = "tickets",
    security(("bearer" = []))
)]
pub async fn update_ticket(
    State(state): State<Arc<ApiState>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
    Json(req): Json<UpdateTicketRequest>,
) -> Result<Json<ApiResponse<TicketView>>, ApiError> {
    let ticket = state.tickets.update_ticket(&caller, &EntityId::from_string(id), req.into()).await?;
    let view = People::new(state.accounts.as_ref()).ticket(ticket).await?;
    Ok(Json(ApiResponse::success(view)))
}

/// Delete a ticket
#[utoipa::path(
    delete,
    path = "/api/v1/tickets/{id}",
    params(("id" = String, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket deleted", body = DeletedView),
        (status = 403, description = "Ticket belongs to another client", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse)
    ),
    tag = "tickets",
    security(("bearer" = []))
)]
pub async fn delete_ticket(
    State(state): State<Arc<ApiState>>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedView>>, ApiError> {
    let id = EntityId::from_string(id);
    state.tickets.delete_ticket(&caller, &id).await?;
    Ok(Json(ApiResponse::success(DeletedView { id: id.to_string() })))
}
