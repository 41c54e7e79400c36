//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::content::ContentError;
use crate::db::StorageError;
use crate::generation::GenerationError;
use crate::review::ReviewError;

/// Error returned by every handler, rendered as `{"error": "..."}`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Model output that could not be extracted or failed validation
    #[error("{0}")]
    Unprocessable(String),

    /// The generation API failed or returned nothing usable
    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed ({}): {}", status, self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => Self::NotFound(format!("{} not found", what)),
            StorageError::Conflict(what) => Self::Conflict(format!("{} already exists", what)),
            StorageError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            StorageError::InvalidInput(msg) => Self::BadRequest(msg),
            StorageError::Auth(e) => e.into(),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmptyPassword => Self::BadRequest(err.to_string()),
            AuthError::Hash(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Background task failed: {}", err))
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        Self::Unprocessable(err.to_string())
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Content(e) => e.into(),
            GenerationError::MissingApiKey => Self::Internal(err.to_string()),
            other => Self::BadGateway(format!("Failed to generate content: {}", other)),
        }
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::InvalidQuality(_) => Self::BadRequest(err.to_string()),
            ReviewError::Update(_) => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentKind, ValidationRule};

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (StorageError::NotFound("Lesson x".into()).into(), StatusCode::NOT_FOUND),
            (StorageError::Conflict("User a".into()).into(), StatusCode::CONFLICT),
            (StorageError::InvalidCredentials.into(), StatusCode::UNAUTHORIZED),
            (StorageError::InvalidInput("bad".into()).into(), StatusCode::BAD_REQUEST),
            (StorageError::Auth(AuthError::EmptyPassword).into(), StatusCode::BAD_REQUEST),
            (AuthError::EmptyPassword.into(), StatusCode::BAD_REQUEST),
            (AuthError::Hash("salt".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
            (ContentError::Extraction.into(), StatusCode::UNPROCESSABLE_ENTITY),
            (
                GenerationError::Content(ContentError::Validation {
                    kind: ContentKind::Quiz,
                    index: 0,
                    rule: ValidationRule::MissingQuestion,
                })
                .into(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (GenerationError::EmptyResponse.into(), StatusCode::BAD_GATEWAY),
            (
                GenerationError::Api {
                    status: 429,
                    message: "quota".into(),
                }
                .into(),
                StatusCode::BAD_GATEWAY,
            ),
            (ReviewError::InvalidQuality(7).into(), StatusCode::BAD_REQUEST),
            (ReviewError::Update("disk".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.status(), status, "{}", err);
        }
    }
}
