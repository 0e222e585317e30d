use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::models::NotificationEvent;
use crate::services::sink::NotificationSink;

/// Bounded retry with linear backoff and jitter for sink deliveries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the given retry (1-based attempt that just failed).
    fn backoff(&self, attempt: u32) -> Duration {
        let jitter_ms = rand::thread_rng().gen_range(0..=100);
        self.base_delay * attempt + Duration::from_millis(jitter_ms)
    }
}

/// Fire-and-forget event emission, decoupled from the booking transaction.
///
/// `publish` only enqueues; a spawned worker drains the channel and pushes
/// events into the sink, retrying per [`RetryPolicy`]. Delivery failures are
/// logged and dropped after the final attempt; they must never fail or roll
/// back a booking.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::UnboundedSender<NotificationEvent>,
}

impl NotificationDispatcher {
    pub fn spawn(sink: Arc<dyn NotificationSink>, policy: RetryPolicy) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<NotificationEvent>();

        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                deliver_with_retry(sink.as_ref(), &event, &policy).await;
            }
            debug!("Notification dispatcher channel closed, worker exiting");
        });

        Self { sender }
    }

    pub fn publish(&self, event: NotificationEvent) {
        debug!(
            "Publishing notification event {} for appointment {}",
            event.kind(),
            event.appointment_id()
        );

        if self.sender.send(event).is_err() {
            // Worker is gone; the booking itself already succeeded.
            warn!("Notification worker unavailable, event dropped");
        }
    }
}

async fn deliver_with_retry(
    sink: &dyn NotificationSink,
    event: &NotificationEvent,
    policy: &RetryPolicy,
) {
    for attempt in 1..=policy.max_attempts {
        match sink.deliver(event).await {
            Ok(()) => {
                debug!(
                    "Delivered {} for appointment {} (attempt {})",
                    event.kind(),
                    event.appointment_id(),
                    attempt
                );
                return;
            }
            Err(e) if attempt < policy.max_attempts => {
                warn!(
                    "Delivery of {} failed (attempt {}/{}): {}",
                    event.kind(),
                    attempt,
                    policy.max_attempts,
                    e
                );
                tokio::time::sleep(policy.backoff(attempt)).await;
            }
            Err(e) => {
                error!(
                    "Giving up on {} for appointment {} after {} attempts: {}",
                    event.kind(),
                    event.appointment_id(),
                    policy.max_attempts,
                    e
                );
            }
        }
    }
}
