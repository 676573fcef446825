use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::autopilot::publisher::PublishError;
use crate::autopilot::AutopilotError;
use crate::models::Phase;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    InvalidState(String),

    #[error("blocked by incomplete phases")]
    Blocked(Vec<Phase>),

    #[error("publishing failed: {0}")]
    Downstream(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidState(_) | Self::Blocked(_) => StatusCode::CONFLICT,
            Self::Downstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code carried in every error body.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::NotFound(_) => "not_found",
            Self::Validation { .. } => "validation_error",
            Self::InvalidState(_) => "invalid_state",
            Self::Blocked(_) => "blocked_by_dependency",
            Self::Downstream(_) | Self::Internal(_) => "downstream_failure",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = json!({
            "success": false,
            "reason": self.reason(),
        });

        match &self {
            Self::Internal(err) => {
                tracing::error!(error = ?err, "Request failed");
                body["error"] = json!("Internal server error");
            }
            Self::Validation { field, .. } => {
                body["error"] = json!(self.to_string());
                body["field"] = json!(field);
            }
            Self::Blocked(phases) => {
                body["error"] = json!(self.to_string());
                body["blockedBy"] = json!(phases);
            }
            _ => body["error"] = json!(self.to_string()),
        }

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        tracing::debug!(error = %err, "Rejected credentials");
        Self::Unauthenticated
    }
}

impl From<AutopilotError> for ApiError {
    fn from(err: AutopilotError) -> Self {
        match err {
            AutopilotError::NotFound => Self::NotFound("suggestion"),
            AutopilotError::InvalidState(_) | AutopilotError::NoPlatforms => {
                Self::InvalidState(err.to_string())
            }
            AutopilotError::Publish(PublishError::NotConfigured) => {
                Self::Downstream("publishing is not configured".into())
            }
            AutopilotError::Publish(err) => {
                tracing::warn!(error = %err, "Publishing failed");
                Self::Downstream(err.to_string())
            }
            AutopilotError::Storage(err) => Self::Internal(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation("body", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation("path", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation("query", rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
