pub mod error;
pub mod models;
pub mod services;

pub use error::NotificationError;
pub use models::{NotificationEvent, ReminderKind};
pub use services::dispatcher::{NotificationDispatcher, RetryPolicy};
pub use services::sink::{LogSink, MemorySink, NotificationSink, WebhookSink};
