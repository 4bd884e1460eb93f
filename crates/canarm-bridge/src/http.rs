//! HTTP client for the CAN bridge service

use std::time::Duration;

use async_trait::async_trait;
use canarm_codec::CanFrame;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use crate::adapter::BusTransport;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::wire::{PollResponse, SendRequest};

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(50);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Bridge client speaking the `/api/can` and `/api/messages` endpoints
#[derive(Debug, Clone)]
pub struct HttpBridge {
    client: Client,
    base_url: Url,
}

impl HttpBridge {
    /// Create a new bridge client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the bridge (e.g., "http://localhost:5260")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a new bridge client with custom timeouts
    pub fn with_config(base_url: &str, timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        // Keep any path prefix: relative joins need a trailing slash
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        Self::with_config(
            &config.base_url,
            Duration::from_millis(config.timeout_ms),
            Duration::from_millis(config.connect_timeout_ms),
        )
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn messages_url(&self, interface: &str, id: u32) -> Result<Url> {
        let mut url = self.base_url.join(&format!("api/messages/{}", interface))?;
        url.query_pairs_mut().append_pair("id", &id.to_string());
        Ok(url)
    }

    async fn extract_error(&self, response: reqwest::Response, status: StatusCode) -> BridgeError {
        let message = match response.text().await {
            Ok(body) if !body.trim().is_empty() => body,
            _ => format!("HTTP {}", status),
        };
        BridgeError::server_error(status.as_u16(), message)
    }
}

#[async_trait]
impl BusTransport for HttpBridge {
    #[instrument(skip(self, frame), fields(iface = %frame.interface, id = frame.id))]
    async fn send(&self, frame: &CanFrame) -> Result<()> {
        frame
            .validate()
            .map_err(|e| BridgeError::InvalidFrame(e.to_string()))?;
        let url = self.base_url.join("api/can")?;
        let body = SendRequest::from_frame(frame);
        debug!(data = %hex::encode(&frame.data), "Posting frame to bridge");

        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.extract_error(response, status).await)
        }
    }

    #[instrument(skip(self))]
    async fn poll(&self, interface: &str, id: u32) -> Result<Vec<Vec<u8>>> {
        let url = self.messages_url(interface, id)?;
        let response = self.client.get(url).send().await?;

        // An unreadable or unexpected body just means nothing new arrived
        let body = response.bytes().await?;
        let payloads = match serde_json::from_slice::<PollResponse>(&body) {
            Ok(parsed) => parsed.payloads(),
            Err(e) => {
                debug!(error = %e, "Ignoring malformed poll response");
                Vec::new()
            }
        };
        debug!(count = payloads.len(), "Polled frames");
        Ok(payloads)
    }
}
