//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used by every HTTP-facing
//! layer of the application: the credential store, the auth and task services,
//! the auth middleware and the route handlers.
//!
//! `AppError` implements `actix_web::error::ResponseError` so handlers can simply
//! return `Result<_, AppError>`. Every error body has the shape `{"message": "..."}`.
//! Server-side failures never expose their detail to the client; it is logged instead.
//! `From` implementations for store, `validator` and `jsonwebtoken` allow easy conversion using the `?` operator.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::store::StoreError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// A bearer token is missing where required, malformed, or expired (HTTP 401).
    Unauthorized(String),
    /// A malformed or otherwise unusable request (HTTP 400).
    BadRequest(String),
    /// Registration with a username that is already taken (HTTP 400).
    DuplicateUsername,
    /// Unknown username or wrong password. Both cases produce this same variant (HTTP 400).
    InvalidCredentials,
    /// The requested resource does not exist or is not visible to the caller (HTTP 404).
    NotFound(String),
    /// Input failed field validation (HTTP 422 Unprocessable Entity).
    ValidationError(String),
    /// The backing store could not be reached (HTTP 500).
    StoreUnavailable(String),
    /// Any other server-side failure (HTTP 500).
    InternalServerError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::DuplicateUsername => write!(f, "Username already exists"),
            AppError::InvalidCredentials => write!(f, "Invalid username or password"),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::StoreUnavailable(msg) => write!(f, "Store Unavailable: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl AppError {
    /// The message placed in the response body.
    ///
    /// Server-side variants collapse to a generic message.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::ValidationError(msg) => msg.clone(),
            AppError::DuplicateUsername | AppError::InvalidCredentials => self.to_string(),
            AppError::StoreUnavailable(_) | AppError::InternalServerError(_) => {
                INTERNAL_MESSAGE.to_string()
            }
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) | AppError::DuplicateUsername | AppError::InvalidCredentials => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::StoreUnavailable(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.public_message()
        }))
    }
}

/// Converts store errors into `AppError`.
///
/// A uniqueness violation only reaches this generic conversion when the caller did not
/// map it to something more specific (the credential store maps it to `DuplicateUsername`).
impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::NotFound => AppError::NotFound("Record not found".into()),
            StoreError::Duplicate(constraint) => {
                AppError::BadRequest(format!("Duplicate value violates {}", constraint))
            }
            StoreError::Unavailable(detail) => AppError::StoreUnavailable(detail),
            StoreError::Backend(detail) => AppError::InternalServerError(detail),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Converts `jsonwebtoken::errors::Error` into `AppError::Unauthorized`.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(format!("Invalid token: {}", error))
    }
}
