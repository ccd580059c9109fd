//! `TelemetrySource` trait definition and shared error types.

use serde_json::Value;

/// Errors that can occur while fetching telemetry from the controller.
///
/// All of these translate to a skip-this-entity condition in the
/// orchestration loop; none abort the run.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Controller returned {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Malformed controller response: {0}")]
    MalformedResponse(String),
}

/// Read access to the controller's per-client telemetry.
///
/// Raw records stay loosely structured: the controller nests
/// health-score, connection, and onboarding fields freely, and the
/// normalizer downstream owns the schema checks.
#[async_trait::async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Fetch the enrichment group for one monitored user: one record
    /// per connected client, each carrying nested `userDetails`.
    async fn fetch_user_enrichment(&self, user_id: &str) -> Result<Vec<Value>, TelemetryError>;

    /// Fetch the detail record for a single device by MAC address.
    async fn fetch_device_detail(&self, mac: &str) -> Result<Value, TelemetryError>;
}
