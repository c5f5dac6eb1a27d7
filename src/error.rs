use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::error::Error;
use std::fmt;

use crate::store::StoreError;

/// A single field that failed request validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// The primary error type for the HTTP layer.
///
/// Every handler returns `AppResult<T>`; the conversion to a status code and
/// JSON body happens in one place, [`IntoResponse`] below.
#[derive(Debug)]
pub enum AppError {
    /// For client errors due to invalid requests.
    BadRequest(String),
    /// For when a requested resource is not found.
    NotFound(String),
    /// For when a backend is temporarily unavailable.
    ServiceUnavailable(String),
    /// For failures reported by a storage backend. The message is passed through.
    Storage(String),
    /// For when user input is invalid.
    InvalidInput(String),
    /// For request bodies with one or more invalid fields.
    Validation(Vec<FieldError>),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::Validation(fields) => write!(f, "Validation failed: {}", summarize(fields)),
        }
    }
}

impl Error for AppError {}

fn summarize(fields: &[FieldError]) -> String {
    fields.iter().map(|f| f.message.as_str()).collect::<Vec<_>>().join("; ")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message, details) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg, None)
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", msg, None)
            }
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg, None),
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                summarize(&fields),
                Some(json!({ "fields": fields })),
            ),
        };

        let mut body = json!({
            "error": {
                "code": error_code,
                "message": error_message,
            },
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        if let Some(details) = details {
            body["error"]["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("Record not found".to_string()),
            StoreError::InvalidFilter(msg) => AppError::InvalidInput(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

/// A type alias for `Result<T, AppError>`, used throughout the application.
pub type AppResult<T> = Result<T, AppError>;

/// Names the missing entity when a storage lookup comes back empty.
pub trait NotFoundExt<T> {
    /// Maps [`StoreError::NotFound`] to `AppError::NotFound("<entity> not found")`;
    /// every other error converts as usual.
    fn or_not_found(self, entity: &str) -> AppResult<T>;
}

impl<T> NotFoundExt<T> for Result<T, StoreError> {
    fn or_not_found(self, entity: &str) -> AppResult<T> {
        self.map_err(|err| match err {
            StoreError::NotFound => AppError::NotFound(format!("{} not found", entity)),
            other => other.into(),
        })
    }
}

/// Helpers for request validation that collect field-level errors.
pub mod validation {
    use super::*;

    /// Returns the trimmed value, or records `"<field> is required"` when it is
    /// missing or blank.
    pub fn required_text(value: Option<String>, field: &str, errors: &mut Vec<FieldError>) -> String {
        match value.map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => v,
            _ => {
                errors.push(FieldError::new(field, format!("{} is required", field)));
                String::new()
            }
        }
    }

    /// Returns the value, recording an error when it is missing or not positive.
    pub fn required_positive(value: Option<i64>, field: &str, errors: &mut Vec<FieldError>) -> i64 {
        match value {
            Some(v) if v > 0 => v,
            Some(v) => {
                errors.push(FieldError::new(field, format!("{} must be positive, got {}", field, v)));
                0
            }
            None => {
                errors.push(FieldError::new(field, format!("{} is required", field)));
                0
            }
        }
    }

    /// Rejects a present but blank value.
    pub fn optional_text(value: Option<String>, field: &str, errors: &mut Vec<FieldError>) -> Option<String> {
        let value = value?.trim().to_string();
        if value.is_empty() {
            errors.push(FieldError::new(field, format!("{} must not be blank", field)));
            return None;
        }
        Some(value)
    }

    /// `Ok(())` when no errors were collected.
    pub fn finish(errors: Vec<FieldError>) -> AppResult<()> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }
}
