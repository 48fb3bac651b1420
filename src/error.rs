use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

/// Every failure a handler can report. All variants render the same
/// `{error:{status,name,message,details}}` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation { message: String, details: Value },
    #[error("Invalid or expired token")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub status: u16,
    pub name: &'static str,
    pub message: String,
    pub details: Value,
}

/// One entry of `details.errors` for field-level violations.
#[derive(Debug, Serialize)]
pub struct FieldViolation {
    pub path: Vec<&'static str>,
    pub message: String,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: json!({}),
        }
    }

    pub fn missing_fields(violations: Vec<FieldViolation>) -> Self {
        Self::Validation {
            message: "Missing required fields".into(),
            details: json!({ "errors": violations }),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::Unauthorized => "UnauthorizedError",
            Self::NotFound(_) => "NotFoundError",
            Self::Internal(_) => "InternalServerError",
        }
    }

    pub fn body(&self) -> ErrorBody {
        let message = match self {
            // internals never reach the client
            Self::Internal(_) => "Something went wrong".to_string(),
            other => other.to_string(),
        };
        let details = match self {
            Self::Validation { details, .. } => details.clone(),
            _ => json!({}),
        };
        ErrorBody {
            error: ErrorDetail {
                status: self.status().as_u16(),
                name: self.name(),
                message,
                details,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(e) = &self {
            error!(error = %e, "internal error");
        }
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

/// Response for panics caught by the outer `CatchPanicLayer`.
pub fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    ApiError::Internal(anyhow::anyhow!("handler panicked")).into_response()
}
