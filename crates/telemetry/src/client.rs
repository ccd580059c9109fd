//! Token-authenticated HTTP client for the controller API.
//!
//! Obtains an auth token from the controller's token endpoint via
//! basic auth, then attaches it as `X-Auth-Token` to telemetry
//! requests. A stale token is refreshed once per request on 401.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use vipwatch_core::ControllerConfig;

use crate::source::{TelemetryError, TelemetrySource};

const AUTH_PATH: &str = "/dna/system/api/v1/auth/token";
const USER_ENRICHMENT_PATH: &str = "/dna/intent/api/v1/user-enrichment-details";
const DEVICE_DETAIL_PATH: &str = "/dna/intent/api/v1/device-detail";

/// Fetches client telemetry from the network controller.
#[derive(Debug)]
pub struct ControllerClient {
    /// Base URL without a trailing slash.
    base_url: String,
    username: String,
    password: String,
    /// Shared HTTP client with a bounded request timeout.
    client: reqwest::Client,
    /// Cached auth token; `None` until the first authenticated call.
    token: RwLock<Option<String>>,
}

impl ControllerClient {
    /// Build a client from controller configuration.
    ///
    /// Requires `base_url`, `username`, and `password` to be set. The
    /// request timeout bounds every call so one unresponsive endpoint
    /// cannot stall a poll cycle.
    pub fn new(config: &ControllerConfig) -> Result<Self, TelemetryError> {
        let username = config
            .username
            .clone()
            .ok_or_else(|| TelemetryError::Auth("controller username not configured".to_string()))?;
        let password = config
            .password
            .clone()
            .ok_or_else(|| TelemetryError::Auth("controller password not configured".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username,
            password,
            client,
            token: RwLock::new(None),
        })
    }

    /// Request a fresh auth token from the controller.
    async fn authenticate(&self) -> Result<String, TelemetryError> {
        let url = format!("{}{}", self.base_url, AUTH_PATH);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(TelemetryError::Auth(format!(
                "controller rejected credentials ({status})"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TelemetryError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        let token = parse_token(&payload)?;
        info!("authenticated against controller");
        Ok(token)
    }

    /// Return the cached token, authenticating on first use.
    async fn token(&self) -> Result<String, TelemetryError> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }
        let token = self.authenticate().await?;
        *self.token.write().await = Some(token.clone());
        Ok(token)
    }

    /// GET a controller endpoint with the auth token attached.
    ///
    /// A 401 invalidates the cached token and retries exactly once
    /// with a fresh one; any other non-2xx status is surfaced as
    /// [`TelemetryError::UnexpectedStatus`].
    async fn get_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        query: &[(&str, &str)],
    ) -> Result<Value, TelemetryError> {
        for attempt in 0..2 {
            let token = self.token().await?;

            let mut request = self.client.get(url).header("X-Auth-Token", &token);
            for (key, value) in headers {
                request = request.header(*key, *value);
            }
            if !query.is_empty() {
                request = request.query(query);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == reqwest::StatusCode::UNAUTHORIZED && attempt == 0 {
                warn!(url, "auth token expired, re-authenticating");
                *self.token.write().await = None;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(TelemetryError::UnexpectedStatus {
                    status: status.as_u16(),
                    body,
                });
            }

            return Ok(response.json().await?);
        }

        Err(TelemetryError::Auth(
            "re-authentication did not yield a usable token".to_string(),
        ))
    }
}

#[async_trait::async_trait]
impl TelemetrySource for ControllerClient {
    async fn fetch_user_enrichment(&self, user_id: &str) -> Result<Vec<Value>, TelemetryError> {
        let url = format!("{}{}", self.base_url, USER_ENRICHMENT_PATH);
        let payload = self
            .get_json(
                &url,
                &[("entity_type", "network_user_id"), ("entity_value", user_id)],
                &[],
            )
            .await?;

        debug!(user_id, "fetched user enrichment");
        match payload {
            Value::Array(records) => Ok(records),
            other => Err(TelemetryError::MalformedResponse(format!(
                "expected enrichment array, got {}",
                json_kind(&other)
            ))),
        }
    }

    async fn fetch_device_detail(&self, mac: &str) -> Result<Value, TelemetryError> {
        let url = format!("{}{}", self.base_url, DEVICE_DETAIL_PATH);
        let payload = self
            .get_json(&url, &[], &[("identifier", "macAddress"), ("searchBy", mac)])
            .await?;

        debug!(mac, "fetched device detail");
        payload
            .get("response")
            .cloned()
            .ok_or_else(|| {
                TelemetryError::MalformedResponse(
                    "device detail payload has no `response` field".to_string(),
                )
            })
    }
}

/// Extract the token string from the auth endpoint payload.
fn parse_token(payload: &Value) -> Result<String, TelemetryError> {
    payload
        .get("Token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            TelemetryError::MalformedResponse("auth payload has no `Token` field".to_string())
        })
}

/// Short JSON type name for error messages.
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
