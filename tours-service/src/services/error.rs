use service_core::error::AppError;
use thiserror::Error;

/// Domain-level auth failures, converted to `AppError` at the handler
/// boundary. Credential failures deliberately collapse into one message.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::AccountDisabled => {
                AppError::Forbidden(anyhow::anyhow!("Account is disabled"))
            }
            ServiceError::InvalidToken => AppError::AuthError(anyhow::anyhow!("Invalid token")),
            ServiceError::TokenExpired => AppError::AuthError(anyhow::anyhow!("Token expired")),
            ServiceError::TokenRevoked => {
                AppError::AuthError(anyhow::anyhow!("Token has been revoked"))
            }
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
            ServiceError::EmailAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            ServiceError::UnknownRole(role) => {
                AppError::BadRequest(anyhow::anyhow!("Unknown role: {}", role))
            }
            ServiceError::ValidationError(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
