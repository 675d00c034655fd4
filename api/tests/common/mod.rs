//! Shared fixtures for route tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

use mg_api::AppContext;
use mg_core::services::otp::{FixedCodeGenerator, ManualClock};
use mg_core::{
    ChallengeKey, CodeProtector, DeliveryChannel, DeliveryError, InMemoryOtpStore,
    JwtSessionIssuer, OtpConfig, OtpRecord, OtpService, OtpStore, RecordVersion, StorageError,
};
use mg_shared::SessionConfig;

pub const TEST_CODE: &str = "123456";
pub const TEST_EMAIL: &str = "user@example.com";
pub const TEST_SECRET: &str = "route-test-secret";

/// Records every message instead of sending it
#[derive(Default)]
pub struct CapturingChannel {
    outbox: Mutex<Vec<SentEmail>>,
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl CapturingChannel {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.outbox.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryChannel for CapturingChannel {
    async fn send(&self, destination: &str, subject: &str, html: &str) -> Result<String, DeliveryError> {
        let mut outbox = self.outbox.lock().unwrap();
        outbox.push(SentEmail {
            to: destination.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(format!("msg_{}", outbox.len()))
    }

    fn provider_name(&self) -> &'static str {
        "capture"
    }
}

/// Provider that rejects everything
pub struct RejectingChannel;

#[async_trait]
impl DeliveryChannel for RejectingChannel {
    async fn send(&self, _: &str, _: &str, _: &str) -> Result<String, DeliveryError> {
        Err(DeliveryError::Rejected {
            status: 422,
            message: "domain not verified".to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "rejecting"
    }
}

/// Store whose backend is down
pub struct UnavailableStore;

#[async_trait]
impl OtpStore for UnavailableStore {
    async fn get(&self, _: &ChallengeKey) -> Result<Option<OtpRecord>, StorageError> {
        Err(StorageError::unavailable("connection refused"))
    }

    async fn replace(&self, _: &OtpRecord) -> Result<(), StorageError> {
        Err(StorageError::unavailable("connection refused"))
    }

    async fn decrement_attempts(&self, _: &ChallengeKey, _: &RecordVersion) -> Result<u32, StorageError> {
        Err(StorageError::unavailable("connection refused"))
    }

    async fn remove(&self, _: &ChallengeKey, _: &RecordVersion) -> Result<(), StorageError> {
        Err(StorageError::unavailable("connection refused"))
    }

    async fn purge_expired(&self, _: DateTime<Utc>) -> Result<usize, StorageError> {
        Err(StorageError::unavailable("connection refused"))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Err(StorageError::unavailable("connection refused"))
    }
}

pub struct TestContext {
    pub context: AppContext,
    pub store: Arc<dyn OtpStore>,
    pub channel: Arc<CapturingChannel>,
    pub clock: Arc<ManualClock>,
}

/// In-memory store, fixed code `123456`, default 300s/3 attempts
pub fn test_context() -> TestContext {
    build_context(Arc::new(InMemoryOtpStore::new()), None)
}

pub fn context_with_store(store: Arc<dyn OtpStore>) -> TestContext {
    build_context(store, None)
}

pub fn context_with_channel(delivery: Arc<dyn DeliveryChannel>) -> TestContext {
    build_context(Arc::new(InMemoryOtpStore::new()), Some(delivery))
}

fn build_context(store: Arc<dyn OtpStore>, delivery: Option<Arc<dyn DeliveryChannel>>) -> TestContext {
    let channel = Arc::new(CapturingChannel::default());
    let delivery = delivery.unwrap_or_else(|| channel.clone());
    let sessions = Arc::new(JwtSessionIssuer::new(&SessionConfig::new(TEST_SECRET)));
    let clock = Arc::new(ManualClock::new(Utc::now()));

    let service = OtpService::new(
        store.clone(),
        delivery,
        sessions.clone(),
        CodeProtector::hashed(None),
        OtpConfig::default(),
    )
    .with_generator(Arc::new(FixedCodeGenerator::new(TEST_CODE)))
    .with_clock(clock.clone());

    TestContext {
        context: AppContext::new(Arc::new(service), sessions),
        store,
        channel,
        clock,
    }
}
