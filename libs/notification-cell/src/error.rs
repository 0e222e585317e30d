use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Webhook returned status {0}")]
    WebhookStatus(u16),
}
