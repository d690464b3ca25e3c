//! Core error types for profiles-rs.
//!
//! [`ApiError`] covers HTTP errors, validation failures, configuration errors
//! and serialization errors. Every variant maps to an HTTP status code and to
//! a JSON error body in the REST-framework shape (`{"detail": ...}` or a
//! per-field error map).

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// A validation failure, optionally broken down per field.
///
/// # Examples
///
/// ```
/// use profiles_core::error::ValidationError;
///
/// let err = ValidationError::new("This field is required.", "required");
/// assert_eq!(err.to_string(), "This field is required.");
///
/// let err = ValidationError::for_field("email", "Enter a valid email address.");
/// assert!(err.field_errors.contains_key("email"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValidationError {
    /// The primary error message (empty for pure field errors).
    pub message: String,
    /// A short code identifying the failure (e.g. "required", "invalid").
    pub code: String,
    /// Per-field error messages, keyed by field name.
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    /// Creates a non-field validation error with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            field_errors: BTreeMap::new(),
        }
    }

    /// Creates a validation error carrying a single field message.
    pub fn for_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::default();
        err.add(field, message);
        err
    }

    /// Appends a message for the given field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns `true` if no message or field error has been recorded.
    pub fn is_empty(&self) -> bool {
        self.message.is_empty() && self.field_errors.is_empty()
    }

    /// Renders the error as a JSON object.
    ///
    /// Field errors become `{"field": ["msg", ...]}`; a top-level message is
    /// reported under `non_field_errors`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        if !self.message.is_empty() {
            map.insert(
                "non_field_errors".to_string(),
                serde_json::json!([self.message]),
            );
        }
        for (field, messages) in &self.field_errors {
            map.insert(field.clone(), serde_json::json!(messages));
        }
        serde_json::Value::Object(map)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            return write!(f, "{}", self.message);
        }
        let mut first = true;
        for (field, messages) in &self.field_errors {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for profiles-rs.
///
/// Each variant maps to an HTTP status code via [`ApiError::status_code`].
#[derive(Error, Debug)]
pub enum ApiError {
    // ── HTTP errors ──────────────────────────────────────────────────

    /// HTTP 400 Bad Request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 401 Unauthorized.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// HTTP 403 Forbidden / Permission Denied.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// HTTP 404 Not Found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP 405 Method Not Allowed.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// HTTP 409 Conflict.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// HTTP 500 Internal Server Error.
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    // ── Validation ───────────────────────────────────────────────────

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The route table or another startup structure is improperly configured.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ApiError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `BadRequest`, `ValidationError`, `SerializationError` -> 400
    /// - `Unauthorized` -> 401
    /// - `PermissionDenied` -> 403
    /// - `NotFound` -> 404
    /// - `MethodNotAllowed` -> 405
    /// - `Conflict` -> 409
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::ValidationError(_) | Self::SerializationError(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::PermissionDenied(_) => 403,
            Self::NotFound(_) => 404,
            Self::MethodNotAllowed(_) => 405,
            Self::Conflict(_) => 409,
            Self::InternalServerError(_)
            | Self::ConfigurationError(_)
            | Self::ImproperlyConfigured(_)
            | Self::IoError(_) => 500,
        }
    }

    /// Returns the JSON body sent to clients for this error.
    ///
    /// Validation errors render their field map; everything else renders
    /// `{"detail": "<message>"}`. Server-side failures do not leak their
    /// internal message.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::ValidationError(err) => err.to_json(),
            Self::BadRequest(msg)
            | Self::Unauthorized(msg)
            | Self::PermissionDenied(msg)
            | Self::NotFound(msg)
            | Self::MethodNotAllowed(msg)
            | Self::Conflict(msg)
            | Self::SerializationError(msg) => serde_json::json!({ "detail": msg }),
            Self::InternalServerError(_)
            | Self::ConfigurationError(_)
            | Self::ImproperlyConfigured(_)
            | Self::IoError(_) => serde_json::json!({ "detail": "A server error occurred." }),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(format!("JSON parse error - {err}"))
    }
}

/// A convenience type alias for `Result<T, ApiError>`.
pub type ApiResult<T> = Result<T, ApiError>;
