// polyglot-api/src/response.rs
// ============================================================================
// Module: API Responses
// Description: JSON envelope and error-to-status mapping.
// Purpose: Give every route one response shape and one status per error kind.
// Dependencies: axum, polyglot-core, serde_json
// ============================================================================

//! ## Overview
//! Successful calls render as `{"success":true,"message":..,"data":..}` and
//! failures as `{"success":false,"message":..,"errors":..}`. `errors` carries
//! the field map for validation failures and is an empty object otherwise.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use polyglot_core::CatalogError;
use polyglot_core::SearchError;
use polyglot_core::ValidationErrors;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::accounts::AccountError;
use crate::auth::AuthError;

// ============================================================================
// SECTION: Success
// ============================================================================

/// Successful route outcome.
#[derive(Debug, Clone)]
pub struct ApiSuccess {
    /// HTTP status code.
    status: StatusCode,
    /// Human-readable message.
    message: &'static str,
    /// Response payload.
    data: Value,
}

impl ApiSuccess {
    /// Builds a `200 OK` outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] when `data` cannot be serialized.
    pub fn ok(message: &'static str, data: &impl Serialize) -> Result<Self, ApiError> {
        Self::with_status(StatusCode::OK, message, data)
    }

    /// Builds a `201 Created` outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] when `data` cannot be serialized.
    pub fn created(message: &'static str, data: &impl Serialize) -> Result<Self, ApiError> {
        Self::with_status(StatusCode::CREATED, message, data)
    }

    /// Builds an outcome with an explicit status.
    fn with_status(
        status: StatusCode,
        message: &'static str,
        data: &impl Serialize,
    ) -> Result<Self, ApiError> {
        let data = serde_json::to_value(data)
            .map_err(|_| ApiError::Internal("response serialization failed".to_string()))?;
        Ok(Self {
            status,
            message,
            data,
        })
    }

    /// Returns the HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

/// Wire shape of a successful response.
#[derive(Serialize)]
struct SuccessEnvelope<'a> {
    /// Always `true`.
    success: bool,
    /// Human-readable message.
    message: &'a str,
    /// Response payload.
    data: &'a Value,
}

impl IntoResponse for ApiSuccess {
    fn into_response(self) -> Response {
        let body = SuccessEnvelope {
            success: true,
            message: self.message,
            data: &self.data,
        };
        (self.status, Json(body)).into_response()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Route failures, each mapped to exactly one HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Field validation failed (422).
    #[error("The given data was invalid.")]
    Validation(ValidationErrors),
    /// Uniqueness conflict (409).
    #[error("{0}")]
    Conflict(String),
    /// Addressed resource does not exist (404).
    #[error("{0}")]
    NotFound(String),
    /// Missing or invalid credentials on a protected route (401).
    #[error("{0}")]
    Unauthenticated(String),
    /// Login rejected (401).
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// Registration is turned off (403).
    #[error("Registration is disabled")]
    RegistrationDisabled,
    /// Body or query could not be decoded (400).
    #[error("{0}")]
    BadRequest(String),
    /// Body exceeds the configured limit (413).
    #[error("request body too large")]
    PayloadTooLarge,
    /// Store unreachable, busy, or past the request deadline (503).
    #[error("{0}")]
    Unavailable(String),
    /// Unexpected server failure (500).
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthenticated(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::RegistrationDisabled => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a stable label for audit events.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::InvalidCredentials => "invalid_credentials",
            Self::RegistrationDisabled => "registration_disabled",
            Self::BadRequest(_) => "bad_request",
            Self::PayloadTooLarge => "payload_too_large",
            Self::Unavailable(_) => "unavailable",
            Self::Internal(_) => "internal",
        }
    }

    /// Returns the message shown to callers. Store and server internals stay
    /// out of responses.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Unavailable(_) => "Service unavailable".to_string(),
            Self::Internal(_) => "Something went wrong".to_string(),
            other => other.to_string(),
        }
    }

    /// Shorthand for the translation-not-found error.
    #[must_use]
    pub fn translation_not_found() -> Self {
        Self::NotFound("Translation not found".to_string())
    }
}

/// Wire shape of a failed response.
#[derive(Serialize)]
struct ErrorEnvelope {
    /// Always `false`.
    success: bool,
    /// Human-readable message.
    message: String,
    /// Field errors, empty unless validation failed.
    errors: Value,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let errors = match &self {
            Self::Validation(fields) => {
                serde_json::to_value(fields).unwrap_or_else(|_| Value::Object(Map::new()))
            }
            _ => Value::Object(Map::new()),
        };
        let body = ErrorEnvelope {
            success: false,
            message: self.public_message(),
            errors,
        };
        (status, Json(body)).into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(fields) => Self::Validation(fields),
            CatalogError::Conflict(message) => Self::Conflict(message),
            CatalogError::NotFound(_) => Self::translation_not_found(),
            CatalogError::StoreUnavailable(message) => Self::Unavailable(message),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::StoreUnavailable(message) => Self::Unavailable(message),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(fields) => Self::Validation(fields),
            AccountError::Conflict(message) => Self::Conflict(message),
            AccountError::InvalidCredentials => Self::InvalidCredentials,
            AccountError::RegistrationDisabled => Self::RegistrationDisabled,
            AccountError::UserNotFound => Self::NotFound("User not found".to_string()),
            AccountError::Unavailable(message) => Self::Unavailable(message),
            AccountError::Hashing(message) => Self::Internal(message),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated(message) => Self::Unauthenticated(message),
            AuthError::Unavailable(message) => Self::Unavailable(message),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
