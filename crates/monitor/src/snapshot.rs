//! Telemetry normalization: raw controller records → [`HealthSnapshot`].
//!
//! The controller returns loosely structured JSON with numeric fields
//! that arrive as numbers or strings depending on firmware. This
//! module owns the schema: required fields fail explicitly with a
//! tagged error, numeric fields are coerced, and the overall health
//! score is extracted from the typed `healthScore` entry list by its
//! `healthType` discriminator.

use serde::Serialize;
use serde_json::Value;

/// Normalization failures. All translate to a skip-this-entity
/// condition in the orchestration loop.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("missing field: {0}")]
    MissingField(String),

    #[error("field {0} is not numeric")]
    InvalidNumericField(String),

    #[error("no health score entry with healthType OVERALL")]
    MissingOverallScore,
}

/// Whether a snapshot came from a user enrichment record or a
/// device detail record. The derived-bandwidth floor only applies
/// to device-level checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Device,
}

/// Canonical per-entity telemetry at one poll instant.
///
/// Constructed fresh from one raw record each poll, never mutated,
/// discarded after the entity is processed.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub kind: EntityKind,
    /// MAC address of the client.
    pub entity_id: String,
    /// Owning user; falls back to the MAC for device records.
    pub user_id: String,
    pub overall_health_score: i64,
    /// Signal-to-noise ratio in dB; may be negative.
    pub snr: f64,
    /// Received signal strength in dBm.
    pub rssi: f64,
    pub issue_count: i64,
    pub tx_link_errors: f64,
    pub rx_link_errors: f64,
    pub connection_status: String,
    pub location: String,
    pub ap_label: String,
    /// Link rates as reported by the controller, in bps.
    pub tx_rate: Option<f64>,
    pub rx_rate: Option<f64>,
    pub onboarding: Option<OnboardingMetrics>,
}

impl HealthSnapshot {
    /// Derived link bandwidth in Mbps, when both rates are reported.
    pub fn bandwidth_mbps(&self) -> Option<f64> {
        match (self.tx_rate, self.rx_rate) {
            (Some(tx), Some(rx)) => Some((tx + rx) / 1_000_000.0),
            _ => None,
        }
    }
}

/// Onboarding timings, rendered verbatim into the alert body.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingMetrics {
    pub average_run_duration: String,
    pub max_run_duration: String,
    pub average_assoc_duration: String,
    pub max_assoc_duration: String,
    pub average_auth_duration: String,
    pub max_dhcp_duration: String,
    pub latest_root_cause_list: Vec<String>,
}

// ── Constructors ────────────────────────────────────────────────────

/// Normalize one user enrichment record (nested `userDetails`).
pub fn from_user_record(record: &Value) -> Result<HealthSnapshot, NormalizeError> {
    let detail = record
        .get("userDetails")
        .ok_or_else(|| NormalizeError::MissingField("userDetails".to_string()))?;
    from_detail(detail, EntityKind::User)
}

/// Normalize one device detail record (flat layout, `macAddress` key).
pub fn from_device_record(detail: &Value) -> Result<HealthSnapshot, NormalizeError> {
    from_detail(detail, EntityKind::Device)
}

fn from_detail(detail: &Value, kind: EntityKind) -> Result<HealthSnapshot, NormalizeError> {
    let entity_id = str_field(detail, "hostMac")
        .or_else(|_| str_field(detail, "macAddress"))
        .map_err(|_| NormalizeError::MissingField("hostMac".to_string()))?;
    let user_id = str_field_or(detail, "userId", &entity_id);

    Ok(HealthSnapshot {
        kind,
        overall_health_score: overall_score(detail)?,
        snr: num_field(detail, "snr")?,
        rssi: num_field(detail, "rssi")?,
        issue_count: int_field(detail, "issueCount")?,
        tx_link_errors: num_field(detail, "txLinkError")?,
        rx_link_errors: num_field(detail, "rxLinkError")?,
        connection_status: str_field_or(detail, "connectionStatus", "unknown"),
        location: str_field_or(detail, "location", "unknown"),
        ap_label: str_field_or(detail, "clientConnection", "unknown"),
        tx_rate: opt_num_field(detail, "txRate")?,
        rx_rate: opt_num_field(detail, "rxRate")?,
        onboarding: detail.get("onboarding").map(onboarding_metrics),
        entity_id,
        user_id,
    })
}

/// Extract the OVERALL entry's score from the `healthScore` list.
///
/// Exposed for the peer aggregator, which applies it best-effort to
/// sibling records.
pub fn overall_score(detail: &Value) -> Result<i64, NormalizeError> {
    let entries = detail
        .get("healthScore")
        .and_then(Value::as_array)
        .ok_or_else(|| NormalizeError::MissingField("healthScore".to_string()))?;

    for entry in entries {
        if entry.get("healthType").and_then(Value::as_str) == Some("OVERALL") {
            return entry
                .get("score")
                .and_then(coerce_i64)
                .ok_or_else(|| NormalizeError::InvalidNumericField("score".to_string()));
        }
    }

    Err(NormalizeError::MissingOverallScore)
}

fn onboarding_metrics(raw: &Value) -> OnboardingMetrics {
    OnboardingMetrics {
        average_run_duration: display_string(raw.get("averageRunDuration")),
        max_run_duration: display_string(raw.get("maxRunDuration")),
        average_assoc_duration: display_string(raw.get("averageAssocDuration")),
        max_assoc_duration: display_string(raw.get("maxAssocDuration")),
        average_auth_duration: display_string(raw.get("averageAuthDuration")),
        max_dhcp_duration: display_string(raw.get("maxDhcpDuration")),
        latest_root_cause_list: raw
            .get("latestRootCauseList")
            .and_then(Value::as_array)
            .map(|list| list.iter().map(|v| display_string(Some(v))).collect())
            .unwrap_or_default(),
    }
}

// ── Field extraction helpers ────────────────────────────────────────

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn num_field(detail: &Value, name: &str) -> Result<f64, NormalizeError> {
    let value = detail
        .get(name)
        .ok_or_else(|| NormalizeError::MissingField(name.to_string()))?;
    coerce_f64(value).ok_or_else(|| NormalizeError::InvalidNumericField(name.to_string()))
}

fn int_field(detail: &Value, name: &str) -> Result<i64, NormalizeError> {
    let value = detail
        .get(name)
        .ok_or_else(|| NormalizeError::MissingField(name.to_string()))?;
    coerce_i64(value).ok_or_else(|| NormalizeError::InvalidNumericField(name.to_string()))
}

/// Optional numeric field: absent or null is fine, present-but-bogus is not.
fn opt_num_field(detail: &Value, name: &str) -> Result<Option<f64>, NormalizeError> {
    match detail.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => coerce_f64(value)
            .map(Some)
            .ok_or_else(|| NormalizeError::InvalidNumericField(name.to_string())),
    }
}

fn str_field(detail: &Value, name: &str) -> Result<String, NormalizeError> {
    detail
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| NormalizeError::MissingField(name.to_string()))
}

fn str_field_or(detail: &Value, name: &str, default: &str) -> String {
    detail
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// Verbatim display form for descriptive values.
fn display_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn detail() -> Value {
        json!({
            "hostMac": "aa:bb:cc:dd:ee:ff",
            "userId": "jdoe",
            "healthScore": [
                {"healthType": "ONBOARDED", "score": 4},
                {"healthType": "OVERALL", "score": 7}
            ],
            "snr": "32.0",
            "rssi": -58.5,
            "issueCount": 1,
            "txLinkError": 0,
            "rxLinkError": "0.0",
            "connectionStatus": "CONNECTED",
            "location": "HQ/Floor2",
            "clientConnection": "AP-Floor2-03",
            "txRate": 54000000.0,
            "rxRate": 54000000.0
        })
    }

    #[test]
    fn normalize_user_record() {
        let record = json!({"userDetails": detail()});
        let snapshot = from_user_record(&record).unwrap();
        assert_eq!(snapshot.kind, EntityKind::User);
        assert_eq!(snapshot.entity_id, "aa:bb:cc:dd:ee:ff");
        assert_eq!(snapshot.user_id, "jdoe");
        assert_eq!(snapshot.overall_health_score, 7);
        assert_eq!(snapshot.snr, 32.0);
        assert_eq!(snapshot.rssi, -58.5);
        assert_eq!(snapshot.issue_count, 1);
        assert_eq!(snapshot.tx_link_errors, 0.0);
        assert_eq!(snapshot.rx_link_errors, 0.0);
        assert!(snapshot.onboarding.is_none());
    }

    #[test]
    fn normalize_coerces_string_numbers() {
        let mut d = detail();
        d["rssi"] = json!("-60");
        d["issueCount"] = json!("3");
        let record = json!({"userDetails": d});
        let snapshot = from_user_record(&record).unwrap();
        assert_eq!(snapshot.rssi, -60.0);
        assert_eq!(snapshot.issue_count, 3);
    }

    #[test]
    fn missing_user_details_fails() {
        let record = json!({"connectedDevice": []});
        assert_eq!(
            from_user_record(&record).unwrap_err(),
            NormalizeError::MissingField("userDetails".to_string())
        );
    }

    #[test]
    fn missing_overall_entry_fails_explicitly() {
        let mut d = detail();
        d["healthScore"] = json!([{"healthType": "ONBOARDED", "score": 4}]);
        let record = json!({"userDetails": d});
        assert_eq!(
            from_user_record(&record).unwrap_err(),
            NormalizeError::MissingOverallScore
        );
    }

    #[test]
    fn missing_health_score_list_fails() {
        let mut d = detail();
        d.as_object_mut().unwrap().remove("healthScore");
        let record = json!({"userDetails": d});
        assert_eq!(
            from_user_record(&record).unwrap_err(),
            NormalizeError::MissingField("healthScore".to_string())
        );
    }

    #[test]
    fn non_numeric_metric_fails_with_field_name() {
        let mut d = detail();
        d["snr"] = json!("not-a-number");
        let record = json!({"userDetails": d});
        assert_eq!(
            from_user_record(&record).unwrap_err(),
            NormalizeError::InvalidNumericField("snr".to_string())
        );
    }

    #[test]
    fn missing_metric_fails_with_field_name() {
        let mut d = detail();
        d.as_object_mut().unwrap().remove("rxLinkError");
        let record = json!({"userDetails": d});
        assert_eq!(
            from_user_record(&record).unwrap_err(),
            NormalizeError::MissingField("rxLinkError".to_string())
        );
    }

    #[test]
    fn descriptive_fields_default_to_unknown() {
        let mut d = detail();
        d.as_object_mut().unwrap().remove("connectionStatus");
        d.as_object_mut().unwrap().remove("location");
        let record = json!({"userDetails": d});
        let snapshot = from_user_record(&record).unwrap();
        assert_eq!(snapshot.connection_status, "unknown");
        assert_eq!(snapshot.location, "unknown");
    }

    #[test]
    fn onboarding_metrics_carried_verbatim() {
        let mut d = detail();
        d["onboarding"] = json!({
            "averageRunDuration": "12935.0",
            "maxRunDuration": 23000,
            "averageAssocDuration": "210.0",
            "latestRootCauseList": ["AAA", "DHCP"]
        });
        let record = json!({"userDetails": d});
        let snapshot = from_user_record(&record).unwrap();
        let onboarding = snapshot.onboarding.unwrap();
        assert_eq!(onboarding.average_run_duration, "12935.0");
        assert_eq!(onboarding.max_run_duration, "23000");
        assert_eq!(onboarding.max_assoc_duration, "n/a");
        assert_eq!(onboarding.latest_root_cause_list, vec!["AAA", "DHCP"]);
    }

    #[test]
    fn device_record_uses_mac_address_key() {
        let mut d = detail();
        let obj = d.as_object_mut().unwrap();
        obj.remove("hostMac");
        obj.remove("userId");
        obj.insert("macAddress".to_string(), json!("11:22:33:44:55:66"));
        let snapshot = from_device_record(&d).unwrap();
        assert_eq!(snapshot.kind, EntityKind::Device);
        assert_eq!(snapshot.entity_id, "11:22:33:44:55:66");
        assert_eq!(snapshot.user_id, "11:22:33:44:55:66");
    }

    #[test]
    fn bandwidth_derived_only_when_both_rates_present() {
        let record = json!({"userDetails": detail()});
        let snapshot = from_user_record(&record).unwrap();
        assert_eq!(snapshot.bandwidth_mbps(), Some(108.0));

        let mut d = detail();
        d.as_object_mut().unwrap().remove("txRate");
        let record = json!({"userDetails": d});
        let snapshot = from_user_record(&record).unwrap();
        assert_eq!(snapshot.bandwidth_mbps(), None);
    }
}
