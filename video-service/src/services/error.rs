use service_core::error::AppError;
use thiserror::Error;

use super::jwt::CredentialError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    UserAlreadyExists,

    /// Token present but unusable. The inner reason is for logs only.
    #[error("Credential rejected: {0}")]
    Credential(#[from] CredentialError),

    #[error("No credentials supplied")]
    MissingCredential,

    #[error("Credential issuance failed")]
    IssuanceFailed,

    #[error("User not found")]
    UserNotFound,

    #[error("Video not found")]
    VideoNotFound,

    #[error("Caller does not own this {0}")]
    NotOwner(&'static str),

    #[error("Media upload failed: {0}")]
    UploadFailed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid user credentials"))
            }
            ServiceError::UserAlreadyExists => AppError::Conflict(anyhow::anyhow!(
                "User with email or username already exists"
            )),
            ServiceError::Credential(reason) => {
                tracing::debug!(%reason, "Credential rejected");
                AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token"))
            }
            ServiceError::MissingCredential => {
                AppError::Unauthorized(anyhow::anyhow!("Unauthorized request"))
            }
            ServiceError::IssuanceFailed => AppError::InternalError(anyhow::anyhow!(
                "Something went wrong while generating credentials"
            )),
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
            ServiceError::VideoNotFound => AppError::NotFound(anyhow::anyhow!("Video not found")),
            ServiceError::NotOwner(kind) => AppError::Forbidden(anyhow::anyhow!(
                "You do not have permission to modify this {}",
                kind
            )),
            ServiceError::UploadFailed(e) => AppError::BadGateway(e),
            ServiceError::ValidationError(e) => AppError::BadRequest(anyhow::anyhow!(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn every_credential_failure_is_unauthorized() {
        for reason in [
            CredentialError::Malformed,
            CredentialError::InvalidSignature,
            CredentialError::Expired,
            CredentialError::StaleOrRevoked,
        ] {
            let err: AppError = ServiceError::Credential(reason).into();
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn ownership_failure_is_forbidden() {
        let err: AppError = ServiceError::NotOwner("video").into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn upload_failure_is_bad_gateway() {
        let err: AppError = ServiceError::UploadFailed("store offline".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
