use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use validator::ValidationErrors;

use crate::utils::retry::{RetryClass, Retryable};

/// Failures coming out of the document store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("{operation} timed out after {}ms", after.as_millis())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// A stored document (or one about to be written) does not match its model.
    #[error("malformed document: {0}")]
    Corrupt(String),

    #[error("{0}")]
    Backend(String),
}

impl Retryable for StoreError {
    fn retry_class(&self) -> RetryClass {
        match self {
            StoreError::Timeout { .. } => RetryClass::Timeout,
            StoreError::Duplicate(_) | StoreError::Corrupt(_) => RetryClass::Fatal,
            StoreError::Backend(_) => RetryClass::Transient,
        }
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, WriteFailure};

        match *err.kind {
            ErrorKind::Write(WriteFailure::WriteError(ref we)) if we.code == 11000 => {
                StoreError::Duplicate(we.message.clone())
            }
            // findAndModify reports duplicate keys as a command error
            ErrorKind::Command(ref ce) if ce.code == 11000 => {
                StoreError::Duplicate(ce.message.clone())
            }
            ErrorKind::BsonDeserialization(ref de) => StoreError::Corrupt(de.to_string()),
            ErrorKind::BsonSerialization(ref se) => StoreError::Corrupt(se.to_string()),
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Caller-visible failures. Every variant renders as a JSON body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Transient(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    /// Wraps a store failure with the caller's context once retries are exhausted.
    pub fn from_store(err: StoreError, timeout_message: &str, context: &str) -> Self {
        match err {
            StoreError::Timeout { .. } => ApiError::Timeout(timeout_message.to_string()),
            StoreError::Duplicate(message) => ApiError::Conflict(message),
            StoreError::Backend(message) => ApiError::Transient(format!("{}: {}", context, message)),
            StoreError::Corrupt(message) => {
                ApiError::Transient(format!("{}: malformed document: {}", context, message))
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Timeout(_) | ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Transient(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::from_store(err, "Database timeout - please try again later", "Database error")
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(validation_message(&errors))
    }
}

/// Flattens validator output into "Validation error: field: message; ..." with
/// fields in a stable order.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, field_errors)| {
            let detail = field_errors
                .iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .next()
                .unwrap_or_else(|| "invalid value".to_string());
            format!("{}: {}", field, detail)
        })
        .collect();
    parts.sort();
    format!("Validation error: {}", parts.join("; "))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            // Server-side failures carry both keys: chat and quiz clients read
            // `error`, lead and otp clients read `message`.
            ApiError::Timeout(message)
            | ApiError::Unavailable(message)
            | ApiError::Transient(message) => json!({ "error": message, "message": message }),
            other => json!({ "status": "error", "message": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
