//! Immutable per-run threshold policy.

use std::time::Duration;

/// Threshold floors and alerting limits for one run.
///
/// Loaded once per run from the watchlist document; read-only
/// thereafter. Every floor is inclusive: a value at or below the
/// floor triggers.
#[derive(Debug, Clone)]
pub struct ThresholdPolicy {
    pub min_health_score: i64,
    /// SNR floor in dB.
    pub min_snr: f64,
    /// Derived-bandwidth floor in Mbps, device-level checks only.
    pub min_bandwidth: f64,
    /// Per-run alert ceiling.
    pub max_alerts_per_run: u32,
    /// Fixed cooldown between consecutive dispatches.
    pub inter_alert_delay: Duration,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            min_health_score: 5,
            min_snr: 15.0,
            min_bandwidth: 1.0,
            max_alerts_per_run: 5,
            inter_alert_delay: Duration::from_secs(30),
        }
    }
}
