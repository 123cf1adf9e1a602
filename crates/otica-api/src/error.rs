//! HTTP error type and its mapping from domain errors

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use otica_core::error::DomainError;

use crate::response::ApiResponse;

const GENERIC_INTERNAL_MESSAGE: &str = "Internal server error";

/// Response extension set on bodies built from a 5xx [`ApiError`]
#[derive(Debug, Clone, Copy)]
pub struct InternalErrorBody;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ValidationError(_) | DomainError::InvalidReference(_) => {
                ApiError::BadRequest(err.to_string())
            }
            DomainError::NotFound(_) => ApiError::NotFound(err.to_string()),
            DomainError::Conflict(_) | DomainError::InvalidState(_) | DomainError::NoOpenCashRegister => {
                ApiError::Conflict(err.to_string())
            }
            DomainError::InvalidCredentials | DomainError::InvalidRefreshToken => {
                ApiError::Unauthorized(err.to_string())
            }
            DomainError::UserNotActive | DomainError::Forbidden(_) => ApiError::Forbidden(err.to_string()),
            DomainError::TooManyAttempts => ApiError::TooManyRequests(err.to_string()),
            DomainError::PasswordHashError(_)
            | DomainError::TokenGenerationError(_)
            | DomainError::DatabaseError(_)
            | DomainError::InternalError(_) => ApiError::InternalError(err.to_string()),
        }
    }
}

/// Response middleware: swaps 5xx error bodies for a generic message unless
/// `http.expose_internal_errors` is on.
pub async fn redact_internal_errors(State(expose): State<bool>, response: Response) -> Response {
    if expose || response.extensions().get::<InternalErrorBody>().is_none() {
        return response;
    }
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    let redacted = Json(ApiResponse::error(GENERIC_INTERNAL_MESSAGE)).into_response();
    let (_, body) = redacted.into_parts();
    Response::from_parts(parts, body)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut internal = false;
        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::TooManyRequests(msg) => {
                tracing::warn!(status = status.as_u16(), "{}", msg);
                msg
            }
            ApiError::MethodNotAllowed => {
                tracing::warn!(status = status.as_u16(), "Method not allowed");
                "Method not allowed".to_string()
            }
            ApiError::ServiceUnavailable(msg) | ApiError::InternalError(msg) => {
                tracing::error!(status = status.as_u16(), "{}", msg);
                internal = true;
                msg
            }
        };

        let mut response = (status, Json(ApiResponse::error(message))).into_response();
        if internal {
            response.extensions_mut().insert(InternalErrorBody);
        }
        response
    }
}
