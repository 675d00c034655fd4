use actix_web::{web, HttpResponse};

use mg_shared::email::mask_email;
use mg_shared::ApiResponse;

use crate::dto::{CheckOtpRequest, SessionResponse};
use crate::handlers::ApiError;
use crate::state::AppContext;

use super::{parse_purpose, validate};

/// Handler for POST /api/v1/auth/email-otp/check-verification-otp
///
/// Verifies a code of any purpose. A `forget-password` code yields a session
/// scoped to password reset only.
pub async fn check_verification_otp(
    context: web::Data<AppContext>,
    request: web::Json<CheckOtpRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();
    validate(&request)?;
    let purpose = parse_purpose(&request.otp_type)?;

    tracing::info!(
        email = %mask_email(&request.email),
        purpose = %purpose,
        "Processing check-verification-otp request"
    );

    let grant = context
        .otp_service
        .verify(&request.email, purpose, &request.otp)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(SessionResponse::from(grant))))
}
