//! Error responses for the pipeline API
//!
//! Every failure leaves the service as `{success: false, error, code, details?, timestamp}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pipeline_shared::FilterError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::services::{ExportError, ReportError};

/// Standard API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    /// Always `false`; lets clients branch on the same field as success bodies
    pub success: bool,
    /// Human-readable error message
    pub error: String,
    /// Error code (e.g., "VALIDATION_ERROR", "BAD_REQUEST")
    pub code: String,
    /// Optional field-level errors for validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Vec<String>>>,
    /// ISO 8601 timestamp
    pub timestamp: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            code: code.into(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_details(mut self, details: HashMap<String, Vec<String>>) -> Self {
        self.details = Some(details);
        self
    }
}

/// Application error type that can be converted to HTTP responses
#[derive(Debug)]
pub enum AppError {
    // Request errors
    BadRequest(String),
    UnsupportedExport(String),
    ValidationError { details: HashMap<String, Vec<String>> },

    // Server errors
    ServiceUnavailable(String),
    DatabaseError(String),
    InternalError(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::UnsupportedExport(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::DatabaseError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::UnsupportedExport(_) => "UNSUPPORTED_EXPORT",
            Self::ValidationError { .. } => "VALIDATION_ERROR",
            Self::ServiceUnavailable(_) => "BACKEND_UNAVAILABLE",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Client-facing message. Server-side detail is logged, never returned.
    pub fn message(&self) -> String {
        match self {
            Self::BadRequest(msg) => msg.clone(),
            Self::UnsupportedExport(kind) => {
                format!("Unsupported export type '{}'. Use division, lead or detail", kind)
            }
            Self::ValidationError { .. } => "Validation failed".to_string(),
            Self::ServiceUnavailable(msg) => {
                tracing::error!("Database unavailable: {}", msg);
                "The reporting database is unavailable".to_string()
            }
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                "A database error occurred".to_string()
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut error = ApiError::new(self.error_code(), self.message());

        if let Self::ValidationError { details } = self {
            error = error.with_details(details);
        }

        (status, Json(error)).into_response()
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Unavailable(msg) => Self::ServiceUnavailable(msg),
            ReportError::Query(msg) => Self::DatabaseError(msg),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Unsupported(kind) => Self::UnsupportedExport(kind),
            ExportError::Report(report) => report.into(),
            ExportError::Workbook(e) => Self::InternalError(e.to_string()),
        }
    }
}

impl From<FilterError> for AppError {
    fn from(err: FilterError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// Result type alias for handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper to add multiple validation errors
pub struct ValidationBuilder {
    details: HashMap<String, Vec<String>>,
}

impl ValidationBuilder {
    pub fn new() -> Self {
        Self {
            details: HashMap::new(),
        }
    }

    pub fn error(mut self, field: &str, message: &str) -> Self {
        self.details
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
        self
    }

    pub fn build(self) -> Option<AppError> {
        if self.details.is_empty() {
            None
        } else {
            Some(AppError::ValidationError {
                details: self.details,
            })
        }
    }
}

impl Default for ValidationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
