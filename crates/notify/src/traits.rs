//! Notifier trait definition and shared error types.

use std::collections::HashMap;

/// Errors that can occur during alert delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A composed alert ready for delivery.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Notification {
    /// The rendered subject line.
    pub subject: String,
    /// The rendered body.
    pub body: String,
    /// Additional metadata (e.g., user id, client MAC).
    pub metadata: HashMap<String, String>,
}

/// Trait for alert channel implementations.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an alert through this channel.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "email").
    fn channel_name(&self) -> &str;
}

/// Result of delivering one alert to a single channel.
#[derive(Debug)]
pub struct DispatchResult {
    pub channel: String,
    pub entity_id: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
