//! Stateless sessions signed as JWTs

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mg_shared::config::SessionConfig;

use crate::domain::entities::OtpPurpose;
use crate::domain::value_objects::{SessionGrant, SessionRequest, SessionScope};
use crate::errors::SessionError;

use super::establisher::SessionEstablisher;

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Email address of the session owner
    pub sub: String,
    /// Session id
    pub sid: Uuid,
    pub scope: SessionScope,
    pub email_verified: bool,
    /// Purpose of the challenge that opened the session
    pub amr: OtpPurpose,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Issues and resolves HS256 session tokens
pub struct JwtSessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
    reset_ttl: Duration,
}

impl JwtSessionIssuer {
    pub fn new(config: &SessionConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            ttl: Duration::seconds(config.ttl_seconds),
            reset_ttl: Duration::seconds(config.reset_ttl_seconds),
        }
    }

    fn ttl_for(&self, scope: SessionScope) -> Duration {
        match scope {
            SessionScope::Full => self.ttl,
            SessionScope::PasswordReset => self.reset_ttl,
        }
    }

    /// Validate a token and return its claims
    pub fn resolve(&self, token: &str) -> Result<SessionClaims, SessionError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::InvalidToken,
            })
    }

    /// Rebuild the grant a valid token represents
    pub fn resolve_grant(&self, token: &str) -> Result<SessionGrant, SessionError> {
        let claims = self.resolve(token)?;
        let issued_at = Utc
            .timestamp_opt(claims.iat, 0)
            .single()
            .ok_or(SessionError::InvalidToken)?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(SessionError::InvalidToken)?;

        Ok(SessionGrant {
            token: token.to_string(),
            session_id: claims.sid,
            identifier: claims.sub,
            scope: claims.scope,
            email_verified: claims.email_verified,
            issued_at,
            expires_at,
        })
    }
}

#[async_trait]
impl SessionEstablisher for JwtSessionIssuer {
    async fn establish_session(&self, request: SessionRequest) -> Result<SessionGrant, SessionError> {
        // Whole seconds, so the grant matches what the token encodes
        let issued_at = Utc
            .timestamp_opt(Utc::now().timestamp(), 0)
            .single()
            .ok_or_else(|| SessionError::Issuance {
                message: "Clock out of range".to_string(),
            })?;
        let expires_at = issued_at + self.ttl_for(request.scope);
        let session_id = Uuid::new_v4();

        let claims = SessionClaims {
            sub: request.identifier.clone(),
            sid: session_id,
            scope: request.scope,
            email_verified: request.email_verified,
            amr: request.purpose,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SessionError::Issuance {
                message: e.to_string(),
            })?;

        tracing::debug!(
            session_id = %session_id,
            scope = request.scope.as_str(),
            challenge_id = %request.challenge_id,
            "Session established"
        );

        Ok(SessionGrant {
            token,
            session_id,
            identifier: request.identifier,
            scope: request.scope,
            email_verified: request.email_verified,
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> JwtSessionIssuer {
        JwtSessionIssuer::new(&SessionConfig::new("test-secret"))
    }

    fn request(scope: SessionScope) -> SessionRequest {
        SessionRequest {
            identifier: "a@example.com".to_string(),
            purpose: OtpPurpose::SignIn,
            scope,
            email_verified: true,
            challenge_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_establish_and_resolve() {
        let issuer = issuer();
        let grant = issuer.establish_session(request(SessionScope::Full)).await.unwrap();

        assert_eq!(grant.identifier, "a@example.com");
        assert_eq!(grant.expires_in(), 7 * 24 * 3600);

        let claims = issuer.resolve(&grant.token).unwrap();
        assert_eq!(claims.sub, "a@example.com");
        assert_eq!(claims.sid, grant.session_id);
        assert_eq!(claims.scope, SessionScope::Full);
        assert!(claims.email_verified);
        assert_eq!(claims.iss, "mailgate");

        assert_eq!(issuer.resolve_grant(&grant.token).unwrap(), grant);
    }

    #[tokio::test]
    async fn test_password_reset_scope_is_short_lived() {
        let grant = issuer()
            .establish_session(request(SessionScope::PasswordReset))
            .await
            .unwrap();
        assert_eq!(grant.scope, SessionScope::PasswordReset);
        assert_eq!(grant.expires_in(), 15 * 60);
    }

    #[tokio::test]
    async fn test_rejects_foreign_signature() {
        let grant = issuer().establish_session(request(SessionScope::Full)).await.unwrap();
        let other = JwtSessionIssuer::new(&SessionConfig::new("other-secret"));
        assert_eq!(other.resolve(&grant.token), Err(SessionError::InvalidToken));
        assert_eq!(issuer().resolve("not-a-token"), Err(SessionError::InvalidToken));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let config = SessionConfig {
            ttl_seconds: -10,
            ..SessionConfig::new("test-secret")
        };
        let issuer = JwtSessionIssuer::new(&config);
        let grant = issuer.establish_session(request(SessionScope::Full)).await.unwrap();
        assert_eq!(issuer.resolve(&grant.token), Err(SessionError::Expired));
    }
}
