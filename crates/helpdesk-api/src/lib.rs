//! HelpDesk API
//!
//! JSON over HTTP for the ticketing core: authentication, the user directory,
//! tickets and their comment threads.
//!
//! # Architecture
//!
//! ```text
//! request ──▶ Identity (bearer JWT ─▶ Caller)
//!         ──▶ route handler
//!         ──▶ TicketService / AccountService ──▶ policy ──▶ store
//!                                            └─▶ notification worker
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use helpdesk_core::{AccountUseCases, TicketUseCases};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub use config::ApiConfig;
pub use error::ApiError;
pub use middleware::auth::{Identity, TokenKeys};
pub use models::*;

/// API state
pub struct ApiState {
    pub tickets: Arc<dyn TicketUseCases>,
    pub accounts: Arc<dyn AccountUseCases>,
    pub tokens: TokenKeys,
    /// API version
    pub version: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "HelpDesk API",
        description = "Support tickets for clients and agents. Successful and failed responses share the envelope { success, data, error }.",
        license(name = "Apache-2.0")
    ),
    paths(
        routes::health::health_check,
        routes::auth::register,
        routes::auth::login,
        routes::auth::me,
        routes::users::list_users,
        routes::tickets::list_tickets,
        routes::tickets::create_ticket,
        routes::tickets::get_ticket,
        routes::tickets::update_ticket,
        routes::tickets::delete_ticket,
        routes::comments::list_comments,
        routes::comments::create_comment,
    ),
    components(
        schemas(
            ErrorResponse, FieldError,
            UserView, UserSummary, RegisterRequest, LoginRequest, AuthResponse,
            TicketView, CreateTicketRequest, UpdateTicketRequest, DeletedView,
            CommentView, CreateCommentRequest,
            routes::health::HealthResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and sign-in"),
        (name = "users", description = "User directory"),
        (name = "tickets", description = "Support tickets"),
        (name = "comments", description = "Ticket comment threads")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

/// Build the API router
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(Arc::new(state))
}

fn api_routes() -> Router<Arc<ApiState>> {
    Router::new()
        .nest("/auth", routes::auth::router())
        .nest("/users", routes::users::router())
        .nest("/tickets", routes::tickets::router())
}
