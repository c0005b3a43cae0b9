use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::domain::ValidationError;
use crate::services::AccountError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ValidationError { field: String, message: String },

    InternalError(String),

    Unauthorized(String),

    Forbidden(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::ValidationError { field, message } => {
                write!(f, "Validation error on {field}: {message}")
            }
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, ApiResponse::<()>::error(msg)),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error("A database error occurred"),
                )
            }
            Self::ValidationError { field, message } => (
                StatusCode::BAD_REQUEST,
                ApiResponse::field_error(field, message),
            ),
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error("An internal error occurred"),
                )
            }
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ApiResponse::error(msg)),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, ApiResponse::error(msg)),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(e) => e.into(),
            AccountError::DuplicateEmail => Self::ValidationError {
                field: "email".to_string(),
                message: AccountError::DuplicateEmail.to_string(),
            },
            AccountError::Auth(e) => Self::Unauthorized(e.to_string()),
            AccountError::NotFound(id) => Self::not_found("Account", id),
            AccountError::Database(msg) => Self::DatabaseError(msg),
            AccountError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{resource} {id} not found"))
    }

    #[must_use]
    pub fn forbidden() -> Self {
        Self::Forbidden("You do not have permission to perform this action.".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::AuthError;
    use http_body_util::BodyExt;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn duplicate_email_maps_to_field_error() {
        let (status, body) = render(AccountError::DuplicateEmail.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(
            body["fields"]["email"][0],
            "user with this email already exists."
        );
    }

    #[tokio::test]
    async fn short_password_maps_to_password_field() {
        let (status, body) =
            render(ValidationError::SecretTooShort { min: 5 }.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["fields"]["password"][0],
            "Ensure this field has at least 5 characters."
        );
    }

    #[tokio::test]
    async fn auth_errors_are_unauthorized() {
        let (status, body) =
            render(AccountError::Auth(AuthError::InvalidCredentials).into()).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body["error"],
            "No active account found with the given credentials"
        );
        assert!(body.get("fields").is_none());
    }

    #[tokio::test]
    async fn forbidden_is_403() {
        let (status, body) = render(ApiError::forbidden()).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            body["error"],
            "You do not have permission to perform this action."
        );
    }

    #[tokio::test]
    async fn internal_details_are_not_leaked() {
        let (status, body) =
            render(AccountError::Database("disk I/O error".to_string()).into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "A database error occurred");
    }
}
