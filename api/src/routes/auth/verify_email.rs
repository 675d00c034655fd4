use actix_web::{web, HttpResponse};

use mg_core::OtpPurpose;
use mg_shared::email::mask_email;
use mg_shared::ApiResponse;

use crate::dto::{OtpSubmission, SessionResponse};
use crate::handlers::ApiError;
use crate::state::AppContext;

use super::validate;

/// Handler for POST /api/v1/auth/email-otp/verify-email
///
/// Confirms ownership of the address with an `email-verification` code. The
/// returned session is marked `email_verified`.
pub async fn verify_email(
    context: web::Data<AppContext>,
    request: web::Json<OtpSubmission>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();
    validate(&request)?;

    tracing::info!(email = %mask_email(&request.email), "Processing email verification");

    let grant = context
        .otp_service
        .verify(&request.email, OtpPurpose::EmailVerification, &request.otp)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(SessionResponse::from(grant))))
}
