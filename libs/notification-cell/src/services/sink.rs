use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use crate::error::NotificationError;
use crate::models::NotificationEvent;

/// Delivery boundary towards the notification collaborator. One attempt per
/// call; retry policy belongs to the dispatcher.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, event: &NotificationEvent) -> Result<(), NotificationError>;
}

/// POSTs events as JSON to the collaborator's webhook endpoint.
pub struct WebhookSink {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn deliver(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(event)
            .send()
            .await
            .map_err(|e| NotificationError::DeliveryFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::WebhookStatus(status.as_u16()));
        }

        Ok(())
    }
}

/// Used when no webhook is configured: events are observable in the logs but
/// go nowhere.
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        info!(
            "Notification event {} for appointment {}",
            event.kind(),
            event.appointment_id()
        );
        Ok(())
    }
}

/// Test sink that records every delivered event.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<NotificationEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<NotificationEvent> {
        self.events.lock().expect("sink lock poisoned").clone()
    }
}

#[async_trait]
impl NotificationSink for MemorySink {
    async fn deliver(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("sink lock poisoned")
            .push(event.clone());
        Ok(())
    }
}
