//! Alert composition via minijinja templates.
//!
//! Renders the alert subject and body from a serializable context
//! (snapshot, ordered reasons, peer block, timestamp). The built-in
//! defaults produce the fixed alert layout; the watchlist may
//! override either template, validated at construction.
//!
//! Templates are arbitrary strings (not pre-registered), so a fresh
//! [`minijinja::Environment`] is created per render call.

use std::collections::HashMap;

use serde::Serialize;

use vipwatch_notify::Notification;

use crate::snapshot::HealthSnapshot;
use crate::watchlist::Templates;

/// Default subject template.
pub const DEFAULT_SUBJECT: &str = "VIP client alert for user {{ client.user_id }}";

/// Default body template, covering identity, the four core metrics,
/// onboarding when present, peer context, and the ordered reasons.
pub const DEFAULT_BODY: &str = r#"VIP client alert raised at {{ now }}.

Please review the information for client {{ client.entity_id }}, which belongs to user {{ client.user_id }}:
Connection Status: {{ client.connection_status }}
Location: {{ client.location }}
Access Point: {{ client.ap_label }}
Health: {{ client.overall_health_score }}
RSSI: {{ client.rssi }}
Issue Count: {{ client.issue_count }}
SNR: {{ client.snr }}
txRate: {{ client.tx_rate }}
rxRate: {{ client.rx_rate }}
{% if client.onboarding %}
Onboarding:
- Average Run Duration: {{ client.onboarding.average_run_duration }}
- Max Run Duration: {{ client.onboarding.max_run_duration }}
- Average Association Duration: {{ client.onboarding.average_assoc_duration }}
- Max Association Duration: {{ client.onboarding.max_assoc_duration }}
- Average Authentication Duration: {{ client.onboarding.average_auth_duration }}
- Max DHCP Duration: {{ client.onboarding.max_dhcp_duration }}
- Latest Root Cause List: {{ client.onboarding.latest_root_cause_list | join(", ") }}
{% endif %}
Health scores of other clients of user {{ client.user_id }}:
{{ peers }}
The reason for the alert:
{% for reason in reasons %}- {{ reason }}
{% endfor %}"#;

/// Template failures; raised at construction (syntax) or render time.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("Template rendering failed: {0}")]
    Template(String),
}

/// Context data available to alert templates.
#[derive(Debug, Serialize)]
struct AlertContext<'a> {
    client: &'a HealthSnapshot,
    reasons: &'a [String],
    peers: &'a str,
    /// Current timestamp in ISO 8601 format.
    now: String,
}

/// Renders alert subject/body pairs from snapshots.
#[derive(Debug, Clone)]
pub struct Composer {
    subject_template: String,
    body_template: String,
}

impl Composer {
    /// Build a composer, applying watchlist overrides over the
    /// defaults. Template syntax is validated here so a bad override
    /// fails at startup, not mid-run.
    pub fn new(overrides: Option<&Templates>) -> Result<Self, ComposeError> {
        let subject_template = overrides
            .and_then(|t| t.subject.clone())
            .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
        let body_template = overrides
            .and_then(|t| t.body.clone())
            .unwrap_or_else(|| DEFAULT_BODY.to_string());

        for (name, template) in [("subject", &subject_template), ("body", &body_template)] {
            let env = minijinja::Environment::new();
            env.template_from_str(template)
                .map_err(|e| ComposeError::Template(format!("invalid {name} template: {e}")))?;
        }

        Ok(Self {
            subject_template,
            body_template,
        })
    }

    /// Render the alert for one snapshot.
    pub fn compose(
        &self,
        snapshot: &HealthSnapshot,
        reasons: &[String],
        peer_block: &str,
    ) -> Result<Notification, ComposeError> {
        let ctx = AlertContext {
            client: snapshot,
            reasons,
            peers: peer_block,
            now: chrono::Utc::now().to_rfc3339(),
        };

        let env = minijinja::Environment::new();
        let subject = env
            .render_str(&self.subject_template, &ctx)
            .map_err(|e| ComposeError::Template(e.to_string()))?
            .trim()
            .to_string();
        let body = env
            .render_str(&self.body_template, &ctx)
            .map_err(|e| ComposeError::Template(e.to_string()))?;

        Ok(Notification {
            subject,
            body,
            metadata: HashMap::from([
                ("entity_id".to_string(), snapshot.entity_id.clone()),
                ("user_id".to_string(), snapshot.user_id.clone()),
            ]),
        })
    }
}

impl Default for Composer {
    fn default() -> Self {
        // The built-in templates are known-valid.
        Self::new(None).expect("default templates are valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{EntityKind, OnboardingMetrics};

    fn snapshot() -> HealthSnapshot {
        HealthSnapshot {
            kind: EntityKind::User,
            entity_id: "aa:bb:cc:dd:ee:ff".to_string(),
            user_id: "jdoe".to_string(),
            overall_health_score: 3,
            snr: 9.5,
            rssi: -71.0,
            issue_count: 2,
            tx_link_errors: 1.0,
            rx_link_errors: 0.0,
            connection_status: "CONNECTED".to_string(),
            location: "HQ/Floor2".to_string(),
            ap_label: "AP-Floor2-03".to_string(),
            tx_rate: Some(6_000_000.0),
            rx_rate: Some(6_000_000.0),
            onboarding: None,
        }
    }

    #[test]
    fn default_subject_cites_user() {
        let composer = Composer::default();
        let notification = composer.compose(&snapshot(), &[], "").unwrap();
        assert_eq!(notification.subject, "VIP client alert for user jdoe");
    }

    #[test]
    fn body_includes_identity_metrics_and_reasons_in_order() {
        let composer = Composer::default();
        let reasons = vec![
            "overall health score is 3, at or below the floor of 5".to_string(),
            "1 tx link errors reported".to_string(),
        ];
        let notification = composer
            .compose(&snapshot(), &reasons, "- laptop\n    * id: x\n    * score: 9\n")
            .unwrap();

        let body = &notification.body;
        assert!(body.contains("client aa:bb:cc:dd:ee:ff"));
        assert!(body.contains("Connection Status: CONNECTED"));
        assert!(body.contains("Location: HQ/Floor2"));
        assert!(body.contains("Health: 3"));
        assert!(body.contains("SNR: 9.5"));
        assert!(body.contains("- laptop"));

        let first = body.find("health score").unwrap();
        let second = body.find("tx link errors").unwrap();
        assert!(first < second, "reasons must keep evaluation order");
    }

    #[test]
    fn onboarding_block_only_when_present() {
        let composer = Composer::default();
        let without = composer.compose(&snapshot(), &[], "").unwrap();
        assert!(!without.body.contains("Onboarding:"));

        let mut with_onboarding = snapshot();
        with_onboarding.onboarding = Some(OnboardingMetrics {
            average_run_duration: "12935.0".to_string(),
            max_run_duration: "23000".to_string(),
            average_assoc_duration: "210.0".to_string(),
            max_assoc_duration: "455.0".to_string(),
            average_auth_duration: "150.0".to_string(),
            max_dhcp_duration: "80.0".to_string(),
            latest_root_cause_list: vec!["AAA".to_string(), "DHCP".to_string()],
        });
        let with = composer.compose(&with_onboarding, &[], "").unwrap();
        assert!(with.body.contains("Onboarding:"));
        assert!(with.body.contains("Average Run Duration: 12935.0"));
        assert!(with.body.contains("Latest Root Cause List: AAA, DHCP"));
    }

    #[test]
    fn metadata_carries_identity() {
        let composer = Composer::default();
        let notification = composer.compose(&snapshot(), &[], "").unwrap();
        assert_eq!(notification.metadata["entity_id"], "aa:bb:cc:dd:ee:ff");
        assert_eq!(notification.metadata["user_id"], "jdoe");
    }

    #[test]
    fn subject_override_is_applied() {
        let templates = Templates {
            subject: Some("degraded: {{ client.entity_id }}".to_string()),
            body: None,
        };
        let composer = Composer::new(Some(&templates)).unwrap();
        let notification = composer.compose(&snapshot(), &[], "").unwrap();
        assert_eq!(notification.subject, "degraded: aa:bb:cc:dd:ee:ff");
        // body falls back to the default
        assert!(notification.body.contains("Connection Status"));
    }

    #[test]
    fn invalid_override_fails_at_construction() {
        let templates = Templates {
            subject: Some("{{ unclosed".to_string()),
            body: None,
        };
        let result = Composer::new(Some(&templates));
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("invalid subject template"), "got: {err}");
    }
}
