//! Service registration and key/value client for Consul-compatible agents
//!
//! A thin wrapper around a discovery agent's HTTP API: it registers the
//! current process as a service (with an HTTP or gRPC health check) and
//! passes basic key/value get, list, put, and delete operations through to
//! the agent's store. Health-check scheduling and catalog storage are
//! entirely the agent's responsibility.
//!
//! # Usage
//!
//! ```rust,no_run
//! use waypost::{CheckKind, CheckOption, RegistryClient};
//!
//! # async fn run() -> waypost::Result<()> {
//! let client = RegistryClient::new(
//!     "127.0.0.1:8500",
//!     "billing",
//!     "10.0.0.12",
//!     9000,
//!     [CheckOption::Kind(CheckKind::Http)],
//! )?;
//!
//! client.register().await?;
//! client.put("config/billing/mode", b"live").await?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod identity;
pub mod kv;
pub mod registration;
pub mod registry;

pub use agent::AgentClient;
pub use config::{CheckConfig, CheckKind, CheckOption, GRPC_HEALTH_SERVICE, RegistrySettings};
pub use error::{Error, Result};
pub use identity::ServiceIdentity;
pub use kv::{KvPair, KvStore, MemoryKv};
pub use registration::{AgentCheck, ServiceRegistration};
pub use registry::RegistryClient;
