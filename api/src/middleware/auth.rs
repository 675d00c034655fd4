//! Bearer session extraction for protected endpoints.
//!
//! The token is read from the `Authorization` header and resolved through the
//! `JwtSessionIssuer` held in `AppContext`.

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use mg_core::SessionGrant;
use mg_shared::error_codes;

use crate::handlers::ApiError;
use crate::state::AppContext;

/// Session resolved from a valid bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedSession(pub SessionGrant);

impl AuthenticatedSession {
    pub fn grant(&self) -> &SessionGrant {
        &self.0
    }

    pub fn into_grant(self) -> SessionGrant {
        self.0
    }
}

impl FromRequest for AuthenticatedSession {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(resolve_session(req))
    }
}

fn resolve_session(req: &HttpRequest) -> Result<AuthenticatedSession, ApiError> {
    let token = extract_bearer_token(req).ok_or_else(|| {
        ApiError::unauthorized(
            error_codes::UNAUTHORIZED,
            "Missing or invalid Authorization header",
        )
    })?;

    let context = req.app_data::<web::Data<AppContext>>().ok_or_else(|| {
        tracing::error!("AppContext missing from app data");
        ApiError::unauthorized(error_codes::UNAUTHORIZED, "Session lookup unavailable")
    })?;

    let grant = context.sessions.resolve_grant(&token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        ApiError::from(e)
    })?;

    Ok(AuthenticatedSession(grant))
}

/// Extracts Bearer token from Authorization header
fn extract_bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|s| s.to_string())
}
