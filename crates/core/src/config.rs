use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env_opt(key).as_deref() {
        Some("true") | Some("1") | Some("yes") => true,
        Some("false") | Some("0") | Some("no") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub controller: ControllerConfig,
    pub smtp: SmtpConfig,
    pub monitor: MonitorConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            controller: ControllerConfig::from_env(),
            smtp: SmtpConfig::from_env(),
            monitor: MonitorConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  controller: url={}, verify_tls={}, timeout={}s",
            self.controller.base_url,
            self.controller.verify_tls,
            self.controller.timeout_secs,
        );
        tracing::info!(
            "  smtp:       host={}, port={}, from={}, recipients={}",
            self.smtp.host,
            self.smtp.port.map(|p| p.to_string()).unwrap_or_else(|| "(default)".to_string()),
            self.smtp.from,
            self.smtp.recipients.len(),
        );
        tracing::info!(
            "  monitor:    watchlist={}, poll_interval={}s",
            self.monitor.watchlist_path.display(),
            self.monitor.poll_interval_secs,
        );
    }
}

// ── Controller ────────────────────────────────────────────────

/// Connection settings for the network controller API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Lab controllers commonly ship self-signed certificates.
    pub verify_tls: bool,
    pub timeout_secs: u64,
}

impl ControllerConfig {
    fn from_env() -> Self {
        Self {
            base_url: env_or("CONTROLLER_BASE_URL", ""),
            username: env_opt("CONTROLLER_USERNAME"),
            password: env_opt("CONTROLLER_PASSWORD"),
            verify_tls: env_bool("CONTROLLER_VERIFY_TLS", false),
            timeout_secs: env_u64("CONTROLLER_TIMEOUT_SECS", 30),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && self.username.is_some() && self.password.is_some()
    }

    /// Fail with the first missing variable; called once at startup.
    pub fn require(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::MissingVar("CONTROLLER_BASE_URL".to_string()));
        }
        if self.username.is_none() {
            return Err(ConfigError::MissingVar("CONTROLLER_USERNAME".to_string()));
        }
        if self.password.is_none() {
            return Err(ConfigError::MissingVar("CONTROLLER_PASSWORD".to_string()));
        }
        Ok(())
    }
}

// ── SMTP ──────────────────────────────────────────────────────

/// Outbound mail settings for alert delivery.
///
/// SMTP credentials are not held here: the email channel resolves
/// `SMTP_USERNAME` / `SMTP_PASSWORD` from the environment at
/// construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: Option<u16>,
    pub tls: Option<bool>,
    pub from: String,
    pub recipients: Vec<String>,
}

impl SmtpConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("SMTP_HOST", ""),
            port: env_opt("SMTP_PORT").and_then(|v| v.parse().ok()),
            tls: env_opt("SMTP_TLS").map(|v| v == "true" || v == "1"),
            from: env_or("SMTP_FROM", "VIP Client Monitoring <alerts@localhost>"),
            recipients: parse_recipients(&env_or("ALERT_RECIPIENTS", "")),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.host.is_empty() && !self.recipients.is_empty()
    }

    /// Fail with the first missing variable; called once at startup
    /// unless the run is a dry run.
    pub fn require(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::MissingVar("SMTP_HOST".to_string()));
        }
        if self.recipients.is_empty() {
            return Err(ConfigError::MissingVar("ALERT_RECIPIENTS".to_string()));
        }
        Ok(())
    }
}

/// Split a comma-separated recipient list, dropping empty entries.
fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Monitor ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub watchlist_path: PathBuf,
    pub poll_interval_secs: u64,
}

impl MonitorConfig {
    fn from_env() -> Self {
        Self {
            watchlist_path: PathBuf::from(env_or("WATCHLIST_PATH", "config/watchlist.yaml")),
            poll_interval_secs: env_u64("POLL_INTERVAL_SECS", 300),
        }
    }
}
