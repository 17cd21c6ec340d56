use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{password::PasswordError, repository::RepoError};

/// Result alias used by every fallible handler.
pub type ApiResult<T> = Result<T, ApiError>;

/// ApiError
///
/// The request-local failure taxonomy. Every variant maps to exactly one HTTP status;
/// none of them is fatal to the running service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested id does not exist (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authenticated (or anonymous) caller lacks the privilege for this resource (403).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing, invalid or expired credential on a required-auth route (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Duplicate email on registration. Rendered as 400 to match the registration contract.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed input: failed field validation, or a body, query or path axum could
    /// not decode (422).
    #[error("Validation failed: {} errors", .0.len())]
    ValidationError(Vec<ValidationErrorDetail>),

    /// Anything else (500). The message is logged, never returned.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// ValidationErrorDetail
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

/// ErrorResponse
///
/// JSON body returned for every `ApiError`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Stable machine-readable code, e.g. "forbidden".
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let unauthorized = matches!(self, ApiError::Unauthorized(_));

        let (code, message, details) = match self {
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::ValidationError(errors) => (
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("internal_error", "An internal error occurred".to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message,
            details,
        });

        let mut response = (status, body).into_response();
        if unauthorized {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        ApiError::ValidationError(details)
    }
}

// --- Extractor rejections ---

/// A request part axum could not decode, reported as a single validation detail.
fn input_rejected(field: &str, message: String) -> ApiError {
    tracing::debug!(field, "request rejected: {}", message);
    ApiError::ValidationError(vec![ValidationErrorDetail {
        field: field.to_string(),
        message,
    }])
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        input_rejected("body", rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        input_rejected("body", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        input_rejected("query", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        input_rejected("path", rejection.body_text())
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::EmailTaken => ApiError::Conflict("Email already registered".to_string()),
            RepoError::Database(e) => ApiError::Internal(format!("Database error: {e}")),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
