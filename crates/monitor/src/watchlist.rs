//! Watchlist document: monitored identities, threshold floors, alert
//! budget, and optional alert templates, parsed from YAML.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::policy::ThresholdPolicy;

/// Errors raised while loading or validating the watchlist.
#[derive(Debug, thiserror::Error)]
pub enum WatchlistError {
    #[error("failed to read watchlist: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse watchlist: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid watchlist: {0}")]
    Invalid(String),
}

/// Top-level watchlist definition parsed from YAML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WatchlistDoc {
    /// User identifiers monitored via enrichment groups.
    #[serde(default)]
    pub users: Vec<String>,
    /// Device MAC addresses monitored individually.
    #[serde(default)]
    pub devices: Vec<String>,
    pub thresholds: Thresholds,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub templates: Option<Templates>,
}

/// Threshold floors; all inclusive (`<=` triggers).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Thresholds {
    pub min_health_score: i64,
    pub min_snr: f64,
    #[serde(default = "default_min_bandwidth")]
    pub min_bandwidth: f64,
}

fn default_min_bandwidth() -> f64 {
    1.0
}

/// Per-run alert budget and inter-alert cooldown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BudgetConfig {
    #[serde(default = "default_max_alerts")]
    pub max_alerts_per_run: u32,
    #[serde(default = "default_delay_secs")]
    pub inter_alert_delay_secs: u64,
}

fn default_max_alerts() -> u32 {
    5
}

fn default_delay_secs() -> u64 {
    30
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_alerts_per_run: default_max_alerts(),
            inter_alert_delay_secs: default_delay_secs(),
        }
    }
}

/// Optional overrides for the alert subject and body templates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Templates {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl WatchlistDoc {
    /// Load and validate a watchlist from a YAML file.
    pub fn from_path(path: &Path) -> Result<Self, WatchlistError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Parse and validate a watchlist from a YAML string.
    pub fn parse(raw: &str) -> Result<Self, WatchlistError> {
        let doc: WatchlistDoc = serde_yaml::from_str(raw)?;
        doc.validate()?;
        Ok(doc)
    }

    /// Structural checks beyond what serde enforces.
    pub fn validate(&self) -> Result<(), WatchlistError> {
        if self.users.is_empty() && self.devices.is_empty() {
            return Err(WatchlistError::Invalid(
                "watchlist names no users and no devices".to_string(),
            ));
        }
        if self.thresholds.min_bandwidth < 0.0 {
            return Err(WatchlistError::Invalid(
                "min_bandwidth must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// The immutable per-run policy derived from this document.
    pub fn policy(&self) -> ThresholdPolicy {
        ThresholdPolicy {
            min_health_score: self.thresholds.min_health_score,
            min_snr: self.thresholds.min_snr,
            min_bandwidth: self.thresholds.min_bandwidth,
            max_alerts_per_run: self.budget.max_alerts_per_run,
            inter_alert_delay: Duration::from_secs(self.budget.inter_alert_delay_secs),
        }
    }
}
