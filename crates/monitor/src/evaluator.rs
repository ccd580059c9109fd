//! Fixed-order multi-criterion threshold evaluation.
//!
//! Every check runs even when an earlier one already fired, so the
//! result carries one reason per violated criterion in a stable
//! order. The evaluator is pure: no I/O, no failure modes.

use crate::policy::ThresholdPolicy;
use crate::snapshot::{EntityKind, HealthSnapshot};

/// Outcome of evaluating one snapshot against the policy.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub alert: bool,
    /// One entry per violated criterion, in evaluation order.
    pub reasons: Vec<String>,
}

/// Evaluate a snapshot against the threshold policy.
///
/// Check order: overall health score, SNR, tx link errors, rx link
/// errors, then (device records only) derived bandwidth. Floors are
/// inclusive; error counts trigger on anything above zero.
pub fn evaluate(snapshot: &HealthSnapshot, policy: &ThresholdPolicy) -> EvaluationResult {
    let mut reasons = Vec::new();

    if snapshot.overall_health_score <= policy.min_health_score {
        reasons.push(format!(
            "overall health score is {}, at or below the floor of {}",
            snapshot.overall_health_score, policy.min_health_score,
        ));
    }

    if snapshot.snr <= policy.min_snr {
        reasons.push(format!(
            "SNR is {} dB, at or below the floor of {} dB",
            snapshot.snr, policy.min_snr,
        ));
    }

    if snapshot.tx_link_errors > 0.0 {
        reasons.push(format!("{} tx link errors reported", snapshot.tx_link_errors));
    }

    if snapshot.rx_link_errors > 0.0 {
        reasons.push(format!("{} rx link errors reported", snapshot.rx_link_errors));
    }

    if snapshot.kind == EntityKind::Device {
        if let Some(bandwidth) = snapshot.bandwidth_mbps() {
            if bandwidth <= policy.min_bandwidth {
                reasons.push(format!(
                    "link bandwidth is {bandwidth:.2} Mbps, at or below the floor of {} Mbps",
                    policy.min_bandwidth,
                ));
            }
        }
    }

    EvaluationResult {
        alert: !reasons.is_empty(),
        reasons,
    }
}
