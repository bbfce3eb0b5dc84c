//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used at the request
//! boundary. Lower layers report their own errors (`AuthError`, `StoreError`,
//! `ConfigError`); `From` implementations fold them into `AppError` so that
//! handlers can use the `?` operator.
//!
//! `AppError` implements `actix_web::error::ResponseError` and always renders a
//! minimal `{"error": "..."}` body. Server-side failures are logged here and
//! reach the client only as a generic message.

use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError, ResponseError},
    http::{header, StatusCode},
    HttpRequest, HttpResponse,
};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::auth::token::AuthError;
use crate::config::ConfigError;
use crate::store::StoreError;

const GENERIC_SERVER_ERROR: &str = "Internal server error";
/// Reported for a registration whose email is taken, however it was detected.
pub const EMAIL_TAKEN: &str = "Email already registered";

/// Represents all possible errors that can surface from a request handler.
#[derive(Debug)]
pub enum AppError {
    /// Missing, malformed or out-of-range input (HTTP 422).
    ValidationError(String),
    /// Missing, invalid or expired credentials (HTTP 401).
    /// The response carries a `WWW-Authenticate: Bearer` challenge.
    Unauthorized(String),
    /// A unique field is already taken, e.g. a registered email (HTTP 400).
    Conflict(String),
    /// The request body could not be read as JSON at all (HTTP 400).
    BadRequest(String),
    /// The resource does not exist or is not visible to the caller (HTTP 404).
    NotFound(String),
    /// The datastore could not serve the request (HTTP 500).
    StoreUnavailable(String),
    /// Any other unexpected server-side failure (HTTP 500).
    InternalServerError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::StoreUnavailable(msg) => write!(f, "Store Unavailable: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StoreUnavailable(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            AppError::Unauthorized(msg) => builder
                .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
                .json(json!({ "error": msg })),
            AppError::StoreUnavailable(detail) | AppError::InternalServerError(detail) => {
                log::error!("{}: {}", self.status_code(), detail);
                builder.json(json!({ "error": GENERIC_SERVER_ERROR }))
            }
            AppError::ValidationError(msg)
            | AppError::Conflict(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg) => builder.json(json!({ "error": msg })),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::Duplicate(what) if what == "email" => {
                AppError::Conflict(EMAIL_TAKEN.into())
            }
            StoreError::Duplicate(what) => AppError::Conflict(format!("{} already exists", what)),
            other => AppError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> AppError {
        match error {
            AuthError::Signing(msg) => AppError::InternalServerError(msg),
            other => {
                log::debug!("rejecting credentials: {}", other);
                AppError::Unauthorized("Could not validate credentials".into())
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(error: actix_web::error::BlockingError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

/// Error handler for `web::JsonConfig`: undecodable fields are validation
/// failures, anything else about the body is a bad request.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    match err {
        JsonPayloadError::Deserialize(e) => AppError::ValidationError(e.to_string()).into(),
        other => AppError::BadRequest(other.to_string()).into(),
    }
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(err.to_string()).into()
}

/// A path segment that does not parse (e.g. a task id that is not a UUID)
/// cannot name an existing resource.
pub fn path_error_handler(_err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::NotFound("Task not found".into()).into()
}
