use actix_web::{web, HttpResponse};

use mg_core::OtpPurpose;
use mg_shared::email::mask_email;
use mg_shared::ApiResponse;

use crate::dto::{OtpSubmission, SessionResponse};
use crate::handlers::ApiError;
use crate::state::AppContext;

use super::validate;

/// Handler for POST /api/v1/auth/sign-in/email-otp
///
/// Exchanges a sign-in code for a session.
///
/// ## Errors
/// - 400 `OTP_INVALID` with `details.attempts_remaining`
/// - 400 `OTP_EXPIRED` / `OTP_NOT_FOUND`
/// - 403 `OTP_ATTEMPTS_EXHAUSTED`
pub async fn sign_in_email_otp(
    context: web::Data<AppContext>,
    request: web::Json<OtpSubmission>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();
    validate(&request)?;

    tracing::info!(email = %mask_email(&request.email), "Processing email OTP sign-in");

    let grant = context
        .otp_service
        .verify(&request.email, OtpPurpose::SignIn, &request.otp)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(SessionResponse::from(grant))))
}
