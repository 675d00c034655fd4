//! Sends templates through a delivery channel

use std::sync::Arc;

use mg_shared::email::mask_email;

use crate::errors::DeliveryError;

use super::delivery::DeliveryChannel;
use super::templates::EmailTemplate;

#[derive(Clone)]
pub struct Mailer {
    channel: Arc<dyn DeliveryChannel>,
}

impl Mailer {
    pub fn new(channel: Arc<dyn DeliveryChannel>) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &Arc<dyn DeliveryChannel> {
        &self.channel
    }

    /// Render `template` and send it to `to`. Returns the provider message id.
    pub async fn send(&self, to: &str, template: &EmailTemplate) -> Result<String, DeliveryError> {
        let rendered = template.render();
        match self.channel.send(to, &rendered.subject, &rendered.html).await {
            Ok(message_id) => {
                tracing::debug!(
                    to = %mask_email(to),
                    provider = self.channel.provider_name(),
                    message_id = %message_id,
                    "Email handed to provider"
                );
                Ok(message_id)
            }
            Err(e) => {
                tracing::warn!(
                    to = %mask_email(to),
                    provider = self.channel.provider_name(),
                    error = %e,
                    event = "email_delivery_failed",
                    "Email provider did not accept message"
                );
                Err(e)
            }
        }
    }

    pub async fn send_verification_link(&self, to: &str, url: &str) -> Result<String, DeliveryError> {
        self.send(to, &EmailTemplate::VerificationLink { url: url.to_string() })
            .await
    }

    pub async fn send_magic_link(&self, to: &str, url: &str) -> Result<String, DeliveryError> {
        self.send(to, &EmailTemplate::MagicLink { url: url.to_string() })
            .await
    }

    pub async fn send_password_reset(&self, to: &str, url: &str) -> Result<String, DeliveryError> {
        self.send(to, &EmailTemplate::PasswordReset { url: url.to_string() })
            .await
    }
}
