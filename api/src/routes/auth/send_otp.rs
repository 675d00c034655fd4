use actix_web::{web, HttpResponse};

use mg_shared::email::mask_email;
use mg_shared::ApiResponse;

use crate::dto::{SendOtpRequest, SendOtpResponse};
use crate::handlers::ApiError;
use crate::state::AppContext;

use super::{parse_purpose, validate};

/// Handler for POST /api/v1/auth/email-otp/send-verification-otp
///
/// Issues a fresh code for `(email, type)` and emails it. A previously sent
/// code for the same pair stops working.
///
/// # Request Body
///
/// ```json
/// { "email": "user@example.com", "type": "sign-in" }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "success": true,
///     "data": { "sent": true, "expires_at": "2025-08-14T10:05:00Z", "expires_in": 300 },
///     "timestamp": "2025-08-14T10:00:00Z"
/// }
/// ```
///
/// ## Errors
/// - 400 `EMAIL_INVALID` / `OTP_TYPE_INVALID`
/// - 502 `EMAIL_DELIVERY_FAILED`
/// - 503 `STORAGE_UNAVAILABLE`
pub async fn send_verification_otp(
    context: web::Data<AppContext>,
    request: web::Json<SendOtpRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();
    validate(&request)?;
    let purpose = parse_purpose(&request.otp_type)?;

    tracing::info!(
        email = %mask_email(&request.email),
        purpose = %purpose,
        "Processing send-verification-otp request"
    );

    let issued = context.otp_service.issue(&request.email, purpose).await?;

    tracing::debug!(
        challenge_id = %issued.record.id,
        message_id = %issued.message_id,
        "Verification code handed to email provider"
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(SendOtpResponse::from(&issued))))
}
