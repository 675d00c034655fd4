//! Development delivery channel that writes messages to the log

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use mg_core::errors::DeliveryError;
use mg_core::services::email::DeliveryChannel;
use mg_shared::email::mask_email;

/// Logs every message instead of sending it. Never use in production: the
/// message body, one-time code included, ends up in the logs.
#[derive(Debug, Default)]
pub struct LogDeliveryChannel;

impl LogDeliveryChannel {
    pub fn new() -> Self {
        warn!("Using log email channel; messages are written to the log and not delivered");
        Self
    }
}

#[async_trait]
impl DeliveryChannel for LogDeliveryChannel {
    async fn send(&self, destination: &str, subject: &str, html: &str) -> Result<String, DeliveryError> {
        let message_id = format!("log-{}", Uuid::new_v4());
        info!(
            email = %mask_email(destination),
            subject = subject,
            message_id = %message_id,
            body = html,
            "Email (not delivered)"
        );
        Ok(message_id)
    }

    fn provider_name(&self) -> &'static str {
        "log"
    }
}
