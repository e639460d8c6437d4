//! # Device Gateway Client
//!
//! HTTP client for the home-automation API that fronts the farm's devices.
//! Two endpoints are used: `GET /api/states` and
//! `POST /api/services/{domain}/{service}`.

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, error, info};

use super::GatewayError;
use crate::config::GatewayConfig;
use crate::models::EntityState;

/// Operations the processor needs from the device gateway
#[async_trait]
pub trait DeviceGateway: Send + Sync + Debug {
    /// Every entity the gateway knows about
    async fn fetch_states(&self) -> Result<Vec<EntityState>, GatewayError>;

    /// Call `{domain}.{service}` for one entity
    async fn execute(
        &self,
        entity_id: &str,
        domain: &str,
        service: &str,
        parameters: &serde_json::Value,
    ) -> Result<(), GatewayError>;

    async fn health_check(&self) -> Result<bool, GatewayError>;
}

/// Request body for a service call: the entity id merged with any object parameters
pub fn service_call_body(entity_id: &str, parameters: &serde_json::Value) -> serde_json::Value {
    let mut body = serde_json::Map::new();
    if let Some(extra) = parameters.as_object() {
        body.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    body.insert(
        "entity_id".to_string(),
        serde_json::Value::String(entity_id.to_string()),
    );
    serde_json::Value::Object(body)
}

pub struct HttpDeviceGateway {
    client: Client,
    base_url: Url,
    timeout_ms: u64,
}

impl Debug for HttpDeviceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The bearer token is deliberately omitted
        f.debug_struct("HttpDeviceGateway")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl HttpDeviceGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let raw_url = config
            .base_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(GatewayError::NotConfigured)?;

        // Joining relative paths needs a trailing slash on the base
        let normalized = if raw_url.ends_with('/') {
            raw_url.to_string()
        } else {
            format!("{raw_url}/")
        };
        let base_url = Url::parse(&normalized).map_err(|e| {
            GatewayError::Configuration(format!("Invalid base URL '{raw_url}': {e}"))
        })?;

        let mut client_builder = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(format!("farm-automation/{}", env!("CARGO_PKG_VERSION")));

        if let Some(token) = config.access_token.as_deref().filter(|t| !t.is_empty()) {
            let mut headers = reqwest::header::HeaderMap::new();
            let mut value: reqwest::header::HeaderValue = format!("Bearer {token}")
                .parse()
                .map_err(|e| GatewayError::Configuration(format!("Invalid access token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
            client_builder = client_builder.default_headers(headers);
        }

        let client = client_builder.build().map_err(|e| {
            GatewayError::Configuration(format!("Failed to create HTTP client: {e}"))
        })?;

        info!(
            "Created HttpDeviceGateway for base_url: {}, timeout: {}ms",
            base_url, config.timeout_ms
        );

        Ok(Self {
            client,
            base_url,
            timeout_ms: config.timeout_ms,
        })
    }

    fn url(&self, path: &str) -> Result<Url, GatewayError> {
        self.base_url
            .join(path)
            .map_err(|e| GatewayError::Configuration(format!("Invalid URL: {e}")))
    }

    async fn error_for_status(response: reqwest::Response) -> GatewayError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!("Device gateway request failed: {} - {}", status, body);
        GatewayError::Status {
            status: status.as_u16(),
            body,
        }
    }
}

#[async_trait]
impl DeviceGateway for HttpDeviceGateway {
    async fn fetch_states(&self) -> Result<Vec<EntityState>, GatewayError> {
        let url = self.url("api/states")?;
        debug!("Fetching entity states from: {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await);
        }

        let states: Vec<EntityState> = response.json().await?;
        debug!("Retrieved {} entity states", states.len());
        Ok(states)
    }

    async fn execute(
        &self,
        entity_id: &str,
        domain: &str,
        service: &str,
        parameters: &serde_json::Value,
    ) -> Result<(), GatewayError> {
        let url = self.url(&format!("api/services/{domain}/{service}"))?;
        debug!(entity_id = entity_id, "Calling device service: {}", url);

        let response = self
            .client
            .post(url)
            .json(&service_call_body(entity_id, parameters))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await);
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, GatewayError> {
        let response = self.client.get(self.url("api/")?).send().await?;
        Ok(response.status().is_success())
    }
}
