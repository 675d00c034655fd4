//! End-to-end issuance and verification through the public API

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use mg_core::services::otp::{FixedCodeGenerator, ManualClock, OtpSweeper, SweeperConfig};
use mg_core::{
    CodeProtector, DeliveryChannel, DeliveryError, DomainError, InMemoryOtpStore,
    JwtSessionIssuer, OtpConfig, OtpPurpose, OtpService, OtpStore, SessionError, SessionScope,
    VerificationError,
};
use mg_shared::SessionConfig;

// Captures outbound mail
#[derive(Default)]
struct CapturingChannel {
    outbox: Mutex<Vec<(String, String)>>,
}

impl CapturingChannel {
    fn last_html(&self) -> Option<String> {
        self.outbox.lock().unwrap().last().map(|(_, html)| html.clone())
    }
}

#[async_trait]
impl DeliveryChannel for CapturingChannel {
    async fn send(&self, destination: &str, _subject: &str, html: &str) -> Result<String, DeliveryError> {
        let mut outbox = self.outbox.lock().unwrap();
        outbox.push((destination.to_string(), html.to_string()));
        Ok(format!("msg_{}", outbox.len()))
    }

    fn provider_name(&self) -> &'static str {
        "capture"
    }
}

struct Setup {
    service: OtpService,
    store: Arc<InMemoryOtpStore>,
    channel: Arc<CapturingChannel>,
    issuer: Arc<JwtSessionIssuer>,
    clock: Arc<ManualClock>,
}

fn setup() -> Setup {
    let store = Arc::new(InMemoryOtpStore::new());
    let channel = Arc::new(CapturingChannel::default());
    let issuer = Arc::new(JwtSessionIssuer::new(&SessionConfig::new("integration-secret")));
    let clock = Arc::new(ManualClock::new(Utc::now()));

    let service = OtpService::new(
        store.clone(),
        channel.clone(),
        issuer.clone(),
        CodeProtector::hashed(Some("pepper".to_string())),
        OtpConfig::default(),
    )
    .with_generator(Arc::new(FixedCodeGenerator::new("123456")))
    .with_clock(clock.clone());

    Setup {
        service,
        store,
        channel,
        issuer,
        clock,
    }
}

#[tokio::test]
async fn test_sign_in_flow_yields_valid_session_token() {
    let s = setup();

    let issued = s.service.issue("user@example.com", OtpPurpose::SignIn).await.unwrap();
    assert_eq!(issued.message_id, "msg_1");
    assert!(s.channel.last_html().unwrap().contains("123456"));

    let grant = s
        .service
        .verify("user@example.com", OtpPurpose::SignIn, "123456")
        .await
        .unwrap();

    let resolved = s.issuer.resolve_grant(&grant.token).unwrap();
    assert_eq!(resolved.identifier, "user@example.com");
    assert_eq!(resolved.session_id, grant.session_id);
    assert_eq!(resolved.scope, SessionScope::Full);
    assert!(resolved.email_verified);
    assert!(s.store.is_empty().await);
}

#[tokio::test]
async fn test_wrong_code_then_right_code() {
    let s = setup();
    s.service.issue("user@example.com", OtpPurpose::SignIn).await.unwrap();

    let err = s
        .service
        .verify("user@example.com", OtpPurpose::SignIn, "000000")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Verification(VerificationError::CodeMismatch {
            attempts_remaining: 2
        })
    ));

    assert!(s
        .service
        .verify("user@example.com", OtpPurpose::SignIn, "123456")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_password_reset_token_is_scoped() {
    let s = setup();
    s.service
        .issue("user@example.com", OtpPurpose::ForgetPassword)
        .await
        .unwrap();

    let grant = s
        .service
        .verify("user@example.com", OtpPurpose::ForgetPassword, "123456")
        .await
        .unwrap();

    let claims = s.issuer.resolve(&grant.token).unwrap();
    assert_eq!(claims.scope, SessionScope::PasswordReset);
    assert_eq!(claims.amr, OtpPurpose::ForgetPassword);
    assert!(grant.expires_in() <= 900);
}

#[tokio::test]
async fn test_token_from_other_secret_is_rejected() {
    let s = setup();
    s.service.issue("user@example.com", OtpPurpose::SignIn).await.unwrap();
    let grant = s
        .service
        .verify("user@example.com", OtpPurpose::SignIn, "123456")
        .await
        .unwrap();

    let other = JwtSessionIssuer::new(&SessionConfig::new("another-secret"));
    assert_eq!(other.resolve(&grant.token).unwrap_err(), SessionError::InvalidToken);
}

#[tokio::test]
async fn test_sweeper_purges_expired_challenges() {
    let s = setup();
    s.service.issue("a@example.com", OtpPurpose::SignIn).await.unwrap();
    s.service.issue("b@example.com", OtpPurpose::SignIn).await.unwrap();

    let store: Arc<dyn OtpStore> = s.store.clone();
    let sweeper = OtpSweeper::new(store, SweeperConfig::from_interval(60)).with_clock(s.clock.clone());

    assert_eq!(sweeper.run_once().await.unwrap().purged, 0);

    s.clock.advance(Duration::seconds(301));
    assert_eq!(sweeper.run_once().await.unwrap().purged, 2);
    assert!(s.store.is_empty().await);

    let err = s
        .service
        .verify("a@example.com", OtpPurpose::SignIn, "123456")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Verification(VerificationError::NoActiveChallenge)
    ));
}
