//! Email one-time-code authentication handlers
//!
//! - Sending a code for any purpose
//! - Signing in, verifying an email address, or checking a code of any purpose
//! - Resolving the current session

pub mod check_otp;
pub mod send_otp;
pub mod session;
pub mod sign_in;
pub mod verify_email;

use validator::Validate;

use mg_core::OtpPurpose;
use mg_shared::error_codes;

use crate::handlers::ApiError;

pub use check_otp::check_verification_otp;
pub use send_otp::send_verification_otp;
pub use session::get_session;
pub use sign_in::sign_in_email_otp;
pub use verify_email::verify_email;

/// Parse the client's `type` field
fn parse_purpose(raw: &str) -> Result<OtpPurpose, ApiError> {
    raw.trim().parse::<OtpPurpose>().map_err(|_| {
        ApiError::bad_request(
            error_codes::OTP_TYPE_INVALID,
            "type must be one of sign-in, email-verification, forget-password",
        )
    })
}

fn validate<T: Validate>(request: &T) -> Result<(), ApiError> {
    request.validate().map_err(|e| ApiError::from_validation(&e))
}
