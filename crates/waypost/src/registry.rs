//! Caller-facing registry client handle
//!
//! Owns the service identity and resolved check configuration, and lazily
//! owns the agent transport. The transport is created at most once per
//! handle behind an initialize-once cell, so concurrent first use is safe;
//! it is never rotated or closed.

use bytes::Bytes;
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::agent::AgentClient;
use crate::config::{CheckConfig, CheckOption, RegistrySettings};
use crate::error::Result;
use crate::identity::ServiceIdentity;
use crate::kv::{KvPair, KvStore};
use crate::registration::ServiceRegistration;

/// Handle for registering a service and using the backend's KV store
///
/// Construction performs no I/O; the agent is first contacted by the
/// initial operation. All failures are recoverable errors returned to the
/// caller; a rejected registration never takes the process down.
#[derive(Debug)]
pub struct RegistryClient {
    address: String,
    identity: ServiceIdentity,
    config: CheckConfig,
    agent: OnceCell<AgentClient>,
}

impl RegistryClient {
    /// Create a handle for the agent at `address`
    ///
    /// Options apply in order over the defaults, later options winning on
    /// conflict; the health URL is derived from `host`/`port` when no
    /// option supplies one.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid identity.
    pub fn new(
        address: impl Into<String>,
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        options: impl IntoIterator<Item = CheckOption>,
    ) -> Result<Self> {
        let identity = ServiceIdentity::new(name, host, port)?;
        let config = CheckConfig::resolve(&identity.host, identity.port, options);
        debug!(service = %identity.name, health_url = %config.health_url(), "Resolved check config");

        Ok(Self {
            address: address.into(),
            identity,
            config,
            agent: OnceCell::new(),
        })
    }

    /// Create a handle from deserialized settings
    pub fn from_settings(settings: &RegistrySettings) -> Result<Self> {
        Self::new(
            settings.address.clone(),
            settings.service_name.clone(),
            settings.service_host.clone(),
            settings.service_port,
            settings.options(),
        )
    }

    /// The identity this handle registers under
    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    /// The resolved check configuration
    pub fn check_config(&self) -> &CheckConfig {
        &self.config
    }

    fn agent(&self) -> Result<&AgentClient> {
        self.agent.get_or_try_init(|| AgentClient::connect(&self.address))
    }

    /// Register this service with the discovery backend
    ///
    /// Builds a fresh registration request from the identity and resolved
    /// configuration on every call.
    pub async fn register(&self) -> Result<()> {
        let registration = ServiceRegistration::build(&self.identity, &self.config);
        self.agent()?.register(&registration).await
    }

    /// Remove this service's registration from the backend
    pub async fn deregister(&self) -> Result<()> {
        self.agent()?.deregister(&self.identity.name).await
    }

    /// Fetch a value from the backend's KV store
    ///
    /// Returns `Ok(None)` when the key is absent; backend failures are
    /// errors, never collapsed into absence.
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.agent()?.get(key).await
    }

    /// List all pairs under `prefix`, in key order
    pub async fn list(&self, prefix: &str) -> Result<Vec<KvPair>> {
        self.agent()?.list(prefix).await
    }

    /// Write a value into the backend's KV store
    pub async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.agent()?.put(key, value).await
    }

    /// Delete a key from the backend's KV store
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.agent()?.delete(key).await
    }
}
