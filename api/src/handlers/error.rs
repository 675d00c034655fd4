//! Mapping from domain failures to HTTP responses

use actix_web::{error::JsonPayloadError, http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use std::collections::HashMap;
use validator::ValidationErrors;

use mg_core::{DeliveryError, DomainError, SessionError, StorageError, VerificationError};
use mg_shared::{error_codes, ErrorResponse};

/// Error returned by every handler. Carries its status and client body.
#[derive(Debug, thiserror::Error)]
#[error("{status}: {}", .body.error)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, body: ErrorResponse) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &ErrorResponse {
        &self.body
    }

    pub fn bad_request(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorResponse::new(code, message))
    }

    pub fn unauthorized(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ErrorResponse::new(code, message))
    }

    /// Request body failed field validation
    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let field_errors = errors.field_errors();

        let code = if field_errors.contains_key("email") {
            error_codes::EMAIL_INVALID
        } else {
            error_codes::VALIDATION_ERROR
        };

        let fields: HashMap<String, Vec<String>> = field_errors
            .into_iter()
            .map(|(field, errors)| {
                let messages = errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();

        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(code, "Invalid request data").add_detail("fields", fields),
        )
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(&self.body)
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation { message } => {
                Self::bad_request(error_codes::VALIDATION_ERROR, message)
            }
            DomainError::Verification(e) => map_verification_error(e),
            DomainError::Delivery(e) => map_delivery_error(e),
            DomainError::Storage(e) => map_storage_error(e),
            DomainError::Session(e) => e.into(),
            DomainError::Internal { message } => {
                tracing::error!(error = %message, "Internal error");
                internal_error()
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::Expired => {
                Self::unauthorized(error_codes::SESSION_EXPIRED, "Session has expired")
            }
            SessionError::InvalidToken => {
                Self::unauthorized(error_codes::SESSION_INVALID, "Invalid session token")
            }
            SessionError::Issuance { message } => {
                tracing::error!(error = %message, "Session issuance failed");
                internal_error()
            }
        }
    }
}

fn map_verification_error(error: VerificationError) -> ApiError {
    match error {
        VerificationError::NoActiveChallenge => ApiError::bad_request(
            error_codes::OTP_NOT_FOUND,
            "No active code for this email. Request a new one",
        ),
        VerificationError::Expired => ApiError::bad_request(
            error_codes::OTP_EXPIRED,
            "The code has expired. Request a new one",
        ),
        VerificationError::AttemptsExhausted => ApiError::new(
            StatusCode::FORBIDDEN,
            ErrorResponse::new(
                error_codes::OTP_ATTEMPTS_EXHAUSTED,
                "Too many incorrect attempts. Request a new code",
            ),
        ),
        VerificationError::CodeMismatch { attempts_remaining } => ApiError::new(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(error_codes::OTP_INVALID, "Invalid code")
                .add_detail("attempts_remaining", attempts_remaining),
        ),
    }
}

fn map_delivery_error(error: DeliveryError) -> ApiError {
    tracing::error!(error = %error, "Email delivery failed");
    ApiError::new(
        StatusCode::BAD_GATEWAY,
        ErrorResponse::new(
            error_codes::EMAIL_DELIVERY_FAILED,
            "The code could not be sent. Try again shortly",
        ),
    )
}

fn map_storage_error(error: StorageError) -> ApiError {
    match error {
        StorageError::Conflict => ApiError::new(
            StatusCode::CONFLICT,
            ErrorResponse::new(
                error_codes::OTP_BUSY,
                "The code is being checked by another request. Try again",
            ),
        ),
        StorageError::Unavailable { message } => {
            tracing::error!(error = %message, "Challenge store unavailable");
            ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::new(
                    error_codes::STORAGE_UNAVAILABLE,
                    "Service temporarily unavailable",
                ),
            )
        }
        StorageError::Corrupted { message } => {
            tracing::error!(error = %message, "Corrupted challenge record");
            internal_error()
        }
    }
}

fn internal_error() -> ApiError {
    ApiError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorResponse::new(error_codes::INTERNAL_ERROR, "An internal error occurred"),
    )
}

/// Replace actix's plain-text body for unparseable JSON with an `ErrorResponse`
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::bad_request(error_codes::BAD_REQUEST, format!("Invalid JSON body: {}", err)).into()
}

/// Fallback for unknown routes
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        error_codes::NOT_FOUND,
        "The requested resource was not found",
    ))
}
