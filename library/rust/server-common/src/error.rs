//! Structured error code system for docvault handlers.
//!
//! Error codes follow the pattern: `SYS_{SERVICE}_{ERROR}`
//!
//! Examples:
//! - `SYS_ASSET_NOT_FOUND`
//! - `SYS_AUTH_TOKEN_EXPIRED`
//! - `SYS_UPLOAD_VALIDATION_FAILED`
//!
//! Each error includes a machine-readable code, human-readable message,
//! a unique request ID for tracing, and optional structured details.

use serde::Serialize;

/// ErrorCode represents a structured error code.
///
/// Error codes follow the `SYS_{SERVICE}_{ERROR}` naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode(String);

impl ErrorCode {
    /// Create a new error code from a string.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Create a standard "not found" error code for a service.
    pub fn not_found(service: &str) -> Self {
        Self(format!("SYS_{}_NOT_FOUND", service.to_uppercase()))
    }

    /// Create a standard "validation failed" error code for a service.
    pub fn validation(service: &str) -> Self {
        Self(format!("SYS_{}_VALIDATION_FAILED", service.to_uppercase()))
    }

    /// Create a standard "internal error" error code for a service.
    pub fn internal(service: &str) -> Self {
        Self(format!("SYS_{}_INTERNAL_ERROR", service.to_uppercase()))
    }

    /// Create a standard "unauthorized" error code for a service.
    pub fn unauthorized(service: &str) -> Self {
        Self(format!("SYS_{}_UNAUTHORIZED", service.to_uppercase()))
    }

    /// Create a standard "method not allowed" error code for a service.
    pub fn method_not_allowed(service: &str) -> Self {
        Self(format!("SYS_{}_METHOD_NOT_ALLOWED", service.to_uppercase()))
    }

    /// Return the error code string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ErrorCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl From<&str> for ErrorCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ErrorCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// ErrorDetail provides additional context for an error field.
///
/// `{ "field": "parts", "reason": "required", "message": "..." }`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub field: String,
    pub reason: String,
    pub message: String,
}

impl ErrorDetail {
    pub fn new(
        field: impl Into<String>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
            message: message.into(),
        }
    }
}

/// ErrorBody is the structured error payload.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ErrorDetail>,
}

/// ErrorResponse wraps ErrorBody in an `{ "error": ... }` envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self::with_details(code, message, vec![])
    }

    /// Create a new error response with code, message, and details.
    pub fn with_details(
        code: impl Into<ErrorCode>,
        message: impl Into<String>,
        details: Vec<ErrorDetail>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                request_id: uuid::Uuid::new_v4().to_string(),
                details,
            },
        }
    }
}

/// ServiceError is a high-level error type that maps to HTTP status codes.
///
/// Each variant carries a structured error code and a caller-safe message.
/// Internal failure text belongs in the logs, never in `message`.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// 404 Not Found
    #[error("{message}")]
    NotFound { code: ErrorCode, message: String },

    /// 400 Bad Request
    #[error("{message}")]
    BadRequest {
        code: ErrorCode,
        message: String,
        details: Vec<ErrorDetail>,
    },

    /// 401 Unauthorized
    #[error("{message}")]
    Unauthorized { code: ErrorCode, message: String },

    /// 405 Method Not Allowed
    #[error("{message}")]
    MethodNotAllowed { code: ErrorCode, message: String },

    /// 500 Internal Server Error
    #[error("{message}")]
    Internal { code: ErrorCode, message: String },
}

impl ServiceError {
    /// Create a NotFound error for a service.
    pub fn not_found(service: &str, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: ErrorCode::not_found(service),
            message: message.into(),
        }
    }

    /// Create a BadRequest error for a service.
    pub fn bad_request(service: &str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: ErrorCode::validation(service),
            message: message.into(),
            details: vec![],
        }
    }

    /// Create a BadRequest error with field-level details.
    pub fn bad_request_with_details(
        service: &str,
        message: impl Into<String>,
        details: Vec<ErrorDetail>,
    ) -> Self {
        Self::BadRequest {
            code: ErrorCode::validation(service),
            message: message.into(),
            details,
        }
    }

    /// Create an Unauthorized error for a service.
    pub fn unauthorized(service: &str, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            code: ErrorCode::unauthorized(service),
            message: message.into(),
        }
    }

    pub fn method_not_allowed(service: &str, message: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            code: ErrorCode::method_not_allowed(service),
            message: message.into(),
        }
    }

    /// Create an Internal error for a service.
    pub fn internal(service: &str, message: impl Into<String>) -> Self {
        Self::Internal {
            code: ErrorCode::internal(service),
            message: message.into(),
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::BadRequest { .. } => 400,
            ServiceError::Unauthorized { .. } => 401,
            ServiceError::NotFound { .. } => 404,
            ServiceError::MethodNotAllowed { .. } => 405,
            ServiceError::Internal { .. } => 500,
        }
    }

    pub fn code(&self) -> &ErrorCode {
        match self {
            ServiceError::NotFound { code, .. }
            | ServiceError::BadRequest { code, .. }
            | ServiceError::Unauthorized { code, .. }
            | ServiceError::MethodNotAllowed { code, .. }
            | ServiceError::Internal { code, .. } => code,
        }
    }

    /// Convert to an ErrorResponse.
    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            ServiceError::NotFound { code, message }
            | ServiceError::Unauthorized { code, message }
            | ServiceError::MethodNotAllowed { code, message }
            | ServiceError::Internal { code, message } => {
                ErrorResponse::new(code.clone(), message.clone())
            }
            ServiceError::BadRequest {
                code,
                message,
                details,
            } => ErrorResponse::with_details(code.clone(), message.clone(), details.clone()),
        }
    }
}

// --- axum integration ---

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::from_u16(self.status_code())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let body = self.to_error_response();
        (status, axum::Json(body)).into_response()
    }
}
