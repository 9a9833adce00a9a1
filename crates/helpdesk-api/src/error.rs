//! Error mapping
//!
//! Every failure leaves the API in the standard envelope with a status code
//! derived from the domain error kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use helpdesk_core::{PolicyError, RepositoryError, ServiceError};

use crate::models::{ApiResponse, ErrorResponse, FieldError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse { code: code.into(), message: message.into(), fields: None },
        }
    }

    pub fn unauthenticated() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required")
    }

    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal server error")
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Unauthenticated => Self::unauthenticated(),
            PolicyError::Forbidden(reason) => {
                tracing::warn!(%reason, "request denied");
                Self::new(StatusCode::FORBIDDEN, "forbidden", reason)
            }
            PolicyError::NotFound(what) => Self::new(StatusCode::NOT_FOUND, "not_found", format!("{what} not found")),
            PolicyError::ValidationFailed(violations) => {
                let mut error = Self::new(StatusCode::BAD_REQUEST, "validation_failed", "validation failed");
                error.body.fields = Some(violations.into_iter().map(FieldError::from).collect());
                error
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Policy(policy) => policy.into(),
            ServiceError::InvalidCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, "invalid_credentials", "invalid email or password")
            }
            ServiceError::Conflict(message) => Self::new(StatusCode::CONFLICT, "conflict", message),
            ServiceError::Repository(RepositoryError::NotFound(what)) => {
                Self::new(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
            }
            ServiceError::Repository(RepositoryError::DuplicateKey(key)) => {
                Self::new(StatusCode::CONFLICT, "conflict", format!("{key} already exists"))
            }
            ServiceError::Repository(other) => Self::internal(other),
            ServiceError::Internal(detail) => Self::internal(detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.body))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::FieldViolation;

    #[test]
    fn test_status_codes() {
        let status = |e: ServiceError| ApiError::from(e).status;
        assert_eq!(status(PolicyError::Unauthenticated.into()), StatusCode::UNAUTHORIZED);
        assert_eq!(status(ServiceError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status(PolicyError::Forbidden("x".into()).into()), StatusCode::FORBIDDEN);
        assert_eq!(status(PolicyError::NotFound("ticket".into()).into()), StatusCode::NOT_FOUND);
        assert_eq!(status(ServiceError::Conflict("taken".into())), StatusCode::CONFLICT);
        assert_eq!(status(RepositoryError::Storage("disk".into()).into()), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_lists_fields() {
        let err = ApiError::from(PolicyError::ValidationFailed(vec![
            FieldViolation { field: "title".into(), reason: "too short".into() },
            FieldViolation { field: "priority".into(), reason: "unknown".into() },
        ]));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let fields = err.body.fields.unwrap();
        assert_eq!(fields.iter().map(|f| f.field.as_str()).collect::<Vec<_>>(), ["title", "priority"]);
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = ApiError::from(ServiceError::Internal("db password leaked".into()));
        assert_eq!(err.body.message, "internal server error");
    }
}
