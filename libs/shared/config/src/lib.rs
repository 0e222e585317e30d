use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub bind_host: String,
    pub bind_port: u16,
    /// Endpoint the notification dispatcher POSTs domain events to.
    /// Empty means events are only logged (delivery is a collaborator concern).
    pub notification_webhook_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                warn!("JWT_SECRET not set, using empty value");
                String::new()
            }),
            bind_host: env::var("BIND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            bind_port: env::var("BIND_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            notification_webhook_url: env::var("NOTIFICATION_WEBHOOK_URL").unwrap_or_else(|_| {
                warn!("NOTIFICATION_WEBHOOK_URL not set, events will be logged only");
                String::new()
            }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }

    pub fn has_notification_webhook(&self) -> bool {
        !self.notification_webhook_url.is_empty()
    }
}
