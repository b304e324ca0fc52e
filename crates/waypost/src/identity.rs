//! Identity of the service instance being registered

use crate::error::{Error, Result};

/// Identity of a service instance as seen by the discovery backend.
///
/// The service name doubles as the registration ID, so two instances
/// registering under the same name replace each other in the catalog.
/// Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    /// Service name, used as both ID and Name in the catalog
    pub name: String,

    /// Host the service is reachable on
    pub host: String,

    /// Port the service listens on
    pub port: u16,
}

impl ServiceIdentity {
    /// Create a validated service identity
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the name is empty or the port is zero.
    /// The agent would accept such a registration and then health-check
    /// a nonexistent endpoint.
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Result<Self> {
        let name = name.into();
        let host = host.into();

        if name.trim().is_empty() {
            return Err(Error::Config("service name is empty".to_string()));
        }
        if host.trim().is_empty() {
            return Err(Error::Config("service host is empty".to_string()));
        }
        if port == 0 {
            return Err(Error::Config("service port must be non-zero".to_string()));
        }

        Ok(Self { name, host, port })
    }
}
