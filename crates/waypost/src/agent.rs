//! HTTP transport for the discovery agent's REST API
//!
//! Encodes registration and key/value requests and decodes agent responses.
//! Health-check execution and catalog storage stay on the agent side; this
//! module only moves payloads.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use bytes::Bytes;
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::kv::{KV_PUT_FLAGS, KvPair, KvStore};
use crate::registration::ServiceRegistration;

/// Client for a single agent's HTTP API
#[derive(Debug, Clone)]
pub struct AgentClient {
    http: HttpClient,
    base_url: String,
}

impl AgentClient {
    /// Create a transport for the agent at `address`
    ///
    /// A bare `host:port` address gains an `http://` scheme; trailing
    /// slashes are trimmed. No connection is opened here; the agent is
    /// first contacted by the initial request.
    pub fn connect(address: &str) -> Result<Self> {
        let base_url = normalize_address(address)?;
        let http = HttpClient::builder()
            .build()
            .map_err(|e| Error::Connection(format!("failed to create HTTP client: {e}")))?;

        debug!(base_url = %base_url, "Created agent transport");
        Ok(Self { http, base_url })
    }

    /// Submit a service registration
    pub async fn register(&self, registration: &ServiceRegistration) -> Result<()> {
        let url = format!("{}/v1/agent/service/register", self.base_url);
        let response = self
            .http
            .put(&url)
            .json(registration)
            .send()
            .await
            .map_err(|e| Error::Connection(format!("agent unreachable: {e}")))?;

        if response.status().is_success() {
            info!(service = %registration.name, address = %registration.address, "Registered service");
            Ok(())
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(service = %registration.name, status = status, "Registration rejected");
            Err(Error::Registration { status, body })
        }
    }

    /// Remove a service registration by ID
    pub async fn deregister(&self, service_id: &str) -> Result<()> {
        let url = format!("{}/v1/agent/service/deregister/{}", self.base_url, service_id);
        let response = self
            .http
            .put(&url)
            .send()
            .await
            .map_err(|e| Error::Connection(format!("agent unreachable: {e}")))?;

        if response.status().is_success() {
            info!(service = %service_id, "Deregistered service");
            Ok(())
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(service = %service_id, status = status, "Deregistration rejected");
            Err(Error::Registration { status, body })
        }
    }
}

#[async_trait]
impl KvStore for AgentClient {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let url = format!("{}/v1/kv/{}", self.base_url, key);
        debug!(key = %key, "KV get");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Connection(format!("agent unreachable: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::KeyValue(format!(
                "get {key} failed with status {}",
                response.status()
            )));
        }

        let entries: Vec<RawKvEntry> = response
            .json()
            .await
            .map_err(|e| Error::Decode(format!("malformed KV response: {e}")))?;

        match entries.into_iter().next() {
            Some(entry) => Ok(Some(entry.into_pair()?.value)),
            None => Ok(None),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<KvPair>> {
        let url = format!("{}/v1/kv/{}", self.base_url, prefix);
        debug!(prefix = %prefix, "KV list");

        let response = self
            .http
            .get(&url)
            .query(&[("recurse", "true")])
            .send()
            .await
            .map_err(|e| Error::Connection(format!("agent unreachable: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(Error::KeyValue(format!(
                "list {prefix} failed with status {}",
                response.status()
            )));
        }

        let entries: Vec<RawKvEntry> = response
            .json()
            .await
            .map_err(|e| Error::Decode(format!("malformed KV response: {e}")))?;

        entries.into_iter().map(RawKvEntry::into_pair).collect()
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let url = format!("{}/v1/kv/{}", self.base_url, key);
        debug!(key = %key, bytes = value.len(), "KV put");

        let response = self
            .http
            .put(&url)
            .query(&[("flags", KV_PUT_FLAGS)])
            .body(value.to_vec())
            .send()
            .await
            .map_err(|e| Error::Connection(format!("agent unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::KeyValue(format!(
                "put {key} failed with status {}",
                response.status()
            )));
        }

        // The agent answers a KV write with a bare boolean body
        let body = response.text().await.unwrap_or_default();
        if body.trim() == "false" {
            return Err(Error::KeyValue(format!("agent declined write of {key}")));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let url = format!("{}/v1/kv/{}", self.base_url, key);
        debug!(key = %key, "KV delete");

        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| Error::Connection(format!("agent unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::KeyValue(format!(
                "delete {key} failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// KV entry as the agent serializes it, value still base64-encoded
#[derive(Debug, Deserialize)]
struct RawKvEntry {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Value")]
    value: Option<String>,
    #[serde(rename = "Flags", default)]
    flags: u64,
}

impl RawKvEntry {
    fn into_pair(self) -> Result<KvPair> {
        let value = match self.value {
            Some(encoded) => Bytes::from(
                BASE64
                    .decode(encoded)
                    .map_err(|e| Error::Decode(format!("invalid base64 for {}: {e}", self.key)))?,
            ),
            None => Bytes::new(),
        };
        Ok(KvPair { key: self.key, value, flags: self.flags })
    }
}

/// Normalize an agent address into a base URL
fn normalize_address(address: &str) -> Result<String> {
    let trimmed = address.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Config("agent address is empty".to_string()));
    }
    if trimmed.contains("://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("http://{trimmed}"))
    }
}
