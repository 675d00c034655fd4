//! Outbound email port

use async_trait::async_trait;

use crate::errors::DeliveryError;

/// Hands a rendered message to an email provider.
///
/// Returns the provider's message id. Transport retries, queuing and bounce
/// handling belong to the provider.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn send(&self, destination: &str, subject: &str, html: &str) -> Result<String, DeliveryError>;

    /// Provider name for logs and health checks
    fn provider_name(&self) -> &'static str;
}
