//! Domain errors

use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("No open cash register")]
    NoOpenCashRegister,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not active")]
    UserNotActive,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Too many login attempts, try again later")]
    TooManyAttempts,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Password hash error: {0}")]
    PasswordHashError(String),

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    pub fn not_found(entity: &str, id: i64) -> Self {
        DomainError::NotFound(format!("{} {}", entity, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::ValidationError(message.into())
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages = Vec::new();
        flatten_validation_errors("", &errors, &mut messages);
        messages.sort();
        DomainError::ValidationError(messages.join("; "))
    }
}

/// Walks nested struct/list errors and renders `path: message` lines.
fn flatten_validation_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(items) => {
                for item in items {
                    let message = item
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| item.code.to_string());
                    out.push(format!("{}: {}", path, message));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_validation_errors(&path, inner, out),
            ValidationErrorsKind::List(entries) => {
                for (index, inner) in entries {
                    flatten_validation_errors(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}
