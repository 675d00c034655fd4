use actix_web::HttpResponse;

use mg_shared::ApiResponse;

use crate::dto::SessionResponse;
use crate::middleware::AuthenticatedSession;

/// Handler for GET /api/v1/auth/get-session
///
/// Returns the session behind the bearer token. Missing, invalid or expired
/// tokens are rejected with 401 by the extractor.
pub async fn get_session(session: AuthenticatedSession) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(SessionResponse::from(
        session.into_grant(),
    )))
}
