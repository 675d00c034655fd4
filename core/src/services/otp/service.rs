//! One-time code issuance and verification

use std::sync::Arc;

use uuid::Uuid;

use mg_shared::email::{is_valid_email, mask_email, normalize_email};

use crate::domain::entities::{ChallengeKey, OtpPurpose, OtpRecord};
use crate::domain::value_objects::SessionGrant;
use crate::errors::{DomainError, DomainResult, StorageError, VerificationError};
use crate::repositories::otp::OtpStore;
use crate::services::email::{DeliveryChannel, Mailer};
use crate::services::session::SessionEstablisher;

use super::clock::{Clock, SystemClock};
use super::config::OtpConfig;
use super::flows::{ChallengeFlow, ChallengeFlows};
use super::generator::{CodeGenerator, OsRngCodeGenerator};
use super::protector::CodeProtector;

/// Outcome of a successful issuance
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    /// The stored record; carries the protected code only
    pub record: OtpRecord,
    /// Provider message id of the email carrying the code
    pub message_id: String,
}

/// Issues one-time codes by email and verifies them into sessions
pub struct OtpService {
    store: Arc<dyn OtpStore>,
    mailer: Mailer,
    sessions: Arc<dyn SessionEstablisher>,
    flows: ChallengeFlows,
    protector: CodeProtector,
    generator: Arc<dyn CodeGenerator>,
    clock: Arc<dyn Clock>,
    config: OtpConfig,
}

impl OtpService {
    /// Create a service with the standard flows, the OS random generator and
    /// the system clock
    pub fn new(
        store: Arc<dyn OtpStore>,
        delivery: Arc<dyn DeliveryChannel>,
        sessions: Arc<dyn SessionEstablisher>,
        protector: CodeProtector,
        config: OtpConfig,
    ) -> Self {
        Self {
            store,
            mailer: Mailer::new(delivery),
            sessions,
            flows: ChallengeFlows::standard(),
            protector,
            generator: Arc::new(OsRngCodeGenerator),
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_flows(mut self, flows: ChallengeFlows) -> Self {
        self.flows = flows;
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    pub fn flows(&self) -> &ChallengeFlows {
        &self.flows
    }

    pub fn store(&self) -> &Arc<dyn OtpStore> {
        &self.store
    }

    /// Issue a new code for `identifier` and email it.
    ///
    /// Any previous code for the same `(identifier, purpose)` stops working as
    /// soon as the new record is stored. When the email cannot be handed to the
    /// provider the new record stays in place and `DomainError::Delivery` is
    /// returned.
    pub async fn issue(&self, identifier: &str, purpose: OtpPurpose) -> DomainResult<IssuedChallenge> {
        let key = self.challenge_key(identifier, purpose)?;
        let flow = self.flow(purpose)?;

        let code = self.generator.generate(self.config.code_length());
        let record_id = Uuid::new_v4();
        let stored = self.protector.protect(&code, &key, record_id)?;
        let record = OtpRecord::with_id(
            record_id,
            &key,
            stored,
            self.clock.now(),
            self.config.ttl(),
            self.config.max_attempts(),
        );

        self.store.replace(&record).await.map_err(|e| {
            tracing::error!(
                email = %mask_email(&key.identifier),
                purpose = %purpose,
                error = %e,
                event = "otp_storage_failed",
                "Failed to store one-time code"
            );
            DomainError::Storage(e)
        })?;

        tracing::info!(
            email = %mask_email(&key.identifier),
            purpose = %purpose,
            challenge_id = %record.id,
            storage_mode = record.code.mode_name(),
            event = "otp_issued",
            "Issued one-time code"
        );

        let template = flow.email(&code, self.expires_in_minutes());
        let message_id = self
            .mailer
            .send(&key.identifier, &template)
            .await
            .map_err(DomainError::Delivery)?;

        Ok(IssuedChallenge { record, message_id })
    }

    /// Check `code` against the active challenge and open a session on success.
    ///
    /// Losing a race to a concurrent verification is retried a bounded number
    /// of times before surfacing `StorageError::Conflict`.
    pub async fn verify(
        &self,
        identifier: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> DomainResult<SessionGrant> {
        let key = self.challenge_key(identifier, purpose)?;
        let flow = self.flow(purpose)?;
        let candidate = code.trim();

        for attempt in 0..=self.config.max_conflict_retries() {
            match self.verify_once(&key, candidate, flow.as_ref()).await {
                Err(DomainError::Storage(StorageError::Conflict)) => {
                    tracing::debug!(
                        email = %mask_email(&key.identifier),
                        purpose = %purpose,
                        attempt = attempt,
                        "Challenge changed during verification, retrying"
                    );
                    tokio::task::yield_now().await;
                }
                result => return result,
            }
        }

        tracing::warn!(
            email = %mask_email(&key.identifier),
            purpose = %purpose,
            event = "otp_conflict_retries_exhausted",
            "Gave up verifying after repeated concurrent modifications"
        );
        Err(StorageError::Conflict.into())
    }

    async fn verify_once(
        &self,
        key: &ChallengeKey,
        candidate: &str,
        flow: &dyn ChallengeFlow,
    ) -> DomainResult<SessionGrant> {
        let now = self.clock.now();

        let record = self
            .store
            .get(key)
            .await
            .map_err(|e| self.storage_failure(key, e))?
            .ok_or(VerificationError::NoActiveChallenge)?;

        if record.is_expired_at(now) {
            match self.store.remove(key, &record.version()).await {
                // Already removed or replaced by someone else
                Ok(()) | Err(StorageError::Conflict) => {}
                Err(e) => return Err(self.storage_failure(key, e)),
            }
            tracing::info!(
                email = %mask_email(&key.identifier),
                purpose = %key.purpose,
                challenge_id = %record.id,
                event = "otp_expired",
                "Rejected expired one-time code"
            );
            return Err(VerificationError::Expired.into());
        }

        if record.is_exhausted() {
            tracing::warn!(
                email = %mask_email(&key.identifier),
                purpose = %key.purpose,
                challenge_id = %record.id,
                event = "otp_attempts_exhausted",
                "Rejected submission for exhausted one-time code"
            );
            return Err(VerificationError::AttemptsExhausted.into());
        }

        let matched = self
            .protector
            .matches(&record.code, candidate, key, record.id)
            .map_err(|e| self.storage_failure(key, e))?;

        if !matched {
            let attempts_remaining = self
                .store
                .decrement_attempts(key, &record.version())
                .await
                .map_err(|e| self.storage_failure(key, e))?;
            tracing::warn!(
                email = %mask_email(&key.identifier),
                purpose = %key.purpose,
                challenge_id = %record.id,
                attempts_remaining = attempts_remaining,
                event = "otp_verification_failed",
                "One-time code mismatch"
            );
            return Err(VerificationError::CodeMismatch { attempts_remaining }.into());
        }

        self.store
            .remove(key, &record.version())
            .await
            .map_err(|e| self.storage_failure(key, e))?;

        tracing::info!(
            email = %mask_email(&key.identifier),
            purpose = %key.purpose,
            challenge_id = %record.id,
            event = "otp_verified",
            "One-time code verified"
        );

        let grant = self
            .sessions
            .establish_session(flow.session_request(&record))
            .await?;
        Ok(grant)
    }

    fn challenge_key(&self, identifier: &str, purpose: OtpPurpose) -> DomainResult<ChallengeKey> {
        if !is_valid_email(identifier) {
            return Err(DomainError::validation("Invalid email address"));
        }
        Ok(ChallengeKey::new(normalize_email(identifier), purpose))
    }

    fn flow(&self, purpose: OtpPurpose) -> DomainResult<Arc<dyn ChallengeFlow>> {
        self.flows.get(purpose).cloned().ok_or_else(|| {
            DomainError::validation(format!("No challenge flow registered for {}", purpose))
        })
    }

    fn storage_failure(&self, key: &ChallengeKey, error: StorageError) -> DomainError {
        if !error.is_transient() {
            tracing::error!(
                email = %mask_email(&key.identifier),
                purpose = %key.purpose,
                error = %error,
                event = "otp_storage_error",
                "Challenge store failure during verification"
            );
        }
        DomainError::Storage(error)
    }

    fn expires_in_minutes(&self) -> i64 {
        (self.config.ttl().num_seconds() + 59) / 60
    }
}
