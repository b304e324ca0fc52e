//! Health-check configuration and option resolution
//!
//! A check configuration starts from fixed defaults, is refined by an ordered
//! sequence of options (later options win on conflict), and finally derives a
//! health endpoint URL from the service identity when none was supplied.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Well-known service name of the standard gRPC health protocol
pub const GRPC_HEALTH_SERVICE: &str = "grpc.health.v1.Health";

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);
pub(crate) const DEFAULT_INTERVAL: Duration = Duration::from_secs(11);
pub(crate) const DEFAULT_DEREGISTER_AFTER: Duration = Duration::from_secs(3);

/// Kind of health check the agent should run against the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    /// Periodic call of the standard gRPC health service
    #[default]
    Grpc,

    /// Periodic HTTP GET against a health endpoint
    Http,
}

/// Resolved health-check configuration for a registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfig {
    /// Timeout for a single health probe
    pub timeout: Duration,

    /// Interval between health probes
    pub interval: Duration,

    /// How long the check may stay critical before the agent drops
    /// the registration
    pub deregister_after: Duration,

    /// Which probe the agent runs
    pub kind: CheckKind,

    /// Health endpoint; derived from the identity when unset
    pub health_url: Option<String>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
            deregister_after: DEFAULT_DEREGISTER_AFTER,
            kind: CheckKind::default(),
            health_url: None,
        }
    }
}

impl CheckConfig {
    /// Fold `options` over the defaults in order, then derive the health URL
    /// from the service address if none of the options supplied one.
    pub fn resolve(
        host: &str,
        port: u16,
        options: impl IntoIterator<Item = CheckOption>,
    ) -> Self {
        let mut config = options
            .into_iter()
            .fold(Self::default(), |config, option| option.apply(config));

        if config.health_url.is_none() {
            config.health_url = Some(match config.kind {
                CheckKind::Http => format!("http://{host}:{port}/health"),
                CheckKind::Grpc => format!("{host}:{port}/{GRPC_HEALTH_SERVICE}"),
            });
        }

        config
    }

    /// The resolved health endpoint
    ///
    /// Always present on a configuration produced by [`CheckConfig::resolve`].
    pub fn health_url(&self) -> &str {
        self.health_url.as_deref().unwrap_or_default()
    }
}

/// A single configuration override
///
/// Options are pure values applied left-to-right; applying two options that
/// target the same field keeps the later one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOption {
    /// Select the probe kind
    Kind(CheckKind),

    /// Use an explicit health endpoint instead of the derived one
    HealthUrl(String),

    /// Timeout for a single probe
    Timeout(Duration),

    /// Interval between probes
    Interval(Duration),

    /// Deregister-critical-after duration
    DeregisterAfter(Duration),
}

impl CheckOption {
    /// Apply this option to a configuration, returning the updated value
    #[must_use]
    pub fn apply(self, mut config: CheckConfig) -> CheckConfig {
        match self {
            CheckOption::Kind(kind) => config.kind = kind,
            CheckOption::HealthUrl(url) => config.health_url = Some(url),
            CheckOption::Timeout(timeout) => config.timeout = timeout,
            CheckOption::Interval(interval) => config.interval = interval,
            CheckOption::DeregisterAfter(after) => config.deregister_after = after,
        }
        config
    }
}

/// Registry client settings, loadable from a configuration file section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Agent address (e.g. "127.0.0.1:8500" or "http://consul:8500")
    pub address: String,

    /// Service name, used as both ID and Name in the catalog
    pub service_name: String,

    /// Host the service is reachable on
    pub service_host: String,

    /// Port the service listens on
    pub service_port: u16,

    /// Which probe the agent runs
    #[serde(default)]
    pub check_kind: CheckKind,

    /// Explicit health endpoint; derived from host/port when omitted
    #[serde(default)]
    pub health_url: Option<String>,

    /// Probe timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Probe interval (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Deregister-critical-after (in seconds)
    #[serde(default = "default_deregister_after_secs")]
    pub deregister_after_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL.as_secs()
}

fn default_deregister_after_secs() -> u64 {
    DEFAULT_DEREGISTER_AFTER.as_secs()
}

impl RegistrySettings {
    /// Express these settings as the equivalent option sequence
    pub fn options(&self) -> Vec<CheckOption> {
        let mut options = vec![
            CheckOption::Kind(self.check_kind),
            CheckOption::Timeout(Duration::from_secs(self.timeout_secs)),
            CheckOption::Interval(Duration::from_secs(self.interval_secs)),
            CheckOption::DeregisterAfter(Duration::from_secs(self.deregister_after_secs)),
        ];
        if let Some(url) = &self.health_url {
            options.push(CheckOption::HealthUrl(url.clone()));
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CheckConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.interval, Duration::from_secs(11));
        assert_eq!(config.deregister_after, Duration::from_secs(3));
        assert_eq!(config.kind, CheckKind::Grpc);
        assert!(config.health_url.is_none());
    }

    #[test]
    fn test_later_option_wins() {
        let config = CheckConfig::resolve(
            "h",
            9000,
            [
                CheckOption::Timeout(Duration::from_secs(1)),
                CheckOption::Timeout(Duration::from_secs(7)),
            ],
        );
        assert_eq!(config.timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_derives_http_health_url() {
        let config = CheckConfig::resolve("h", 9000, [CheckOption::Kind(CheckKind::Http)]);
        assert_eq!(config.health_url(), "http://h:9000/health");
    }

    #[test]
    fn test_derives_grpc_health_url() {
        let config = CheckConfig::resolve("h", 9000, []);
        assert_eq!(config.kind, CheckKind::Grpc);
        assert_eq!(config.health_url(), "h:9000/grpc.health.v1.Health");
    }

    #[test]
    fn test_explicit_health_url_not_overwritten() {
        let config = CheckConfig::resolve(
            "h",
            9000,
            [
                CheckOption::HealthUrl("http://elsewhere:1234/status".to_string()),
                CheckOption::Kind(CheckKind::Http),
            ],
        );
        assert_eq!(config.health_url(), "http://elsewhere:1234/status");

        let config = CheckConfig::resolve(
            "h",
            9000,
            [CheckOption::HealthUrl("grpc-target:50051/custom.Health".to_string())],
        );
        assert_eq!(config.health_url(), "grpc-target:50051/custom.Health");
    }

    #[test]
    fn test_option_order_kind_then_url() {
        // The URL option is independent of when the kind is set
        let config = CheckConfig::resolve(
            "h",
            9000,
            [
                CheckOption::Kind(CheckKind::Grpc),
                CheckOption::Kind(CheckKind::Http),
            ],
        );
        assert_eq!(config.kind, CheckKind::Http);
        assert_eq!(config.health_url(), "http://h:9000/health");
    }

    #[test]
    fn test_settings_defaults() {
        let settings: RegistrySettings = serde_json::from_str(
            r#"{
                "address": "127.0.0.1:8500",
                "service_name": "svc",
                "service_host": "h",
                "service_port": 9000
            }"#,
        )
        .unwrap();

        assert_eq!(settings.check_kind, CheckKind::Grpc);
        assert!(settings.health_url.is_none());
        assert_eq!(settings.timeout_secs, 3);
        assert_eq!(settings.interval_secs, 11);
        assert_eq!(settings.deregister_after_secs, 3);
    }

    #[test]
    fn test_settings_options_resolve() {
        let settings: RegistrySettings = serde_json::from_str(
            r#"{
                "address": "127.0.0.1:8500",
                "service_name": "svc",
                "service_host": "h",
                "service_port": 9000,
                "check_kind": "http",
                "timeout_secs": 5
            }"#,
        )
        .unwrap();

        let config = CheckConfig::resolve("h", 9000, settings.options());
        assert_eq!(config.kind, CheckKind::Http);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.health_url(), "http://h:9000/health");
    }

    #[test]
    fn test_check_kind_serde() {
        let kind: CheckKind = serde_json::from_str(r#""http""#).unwrap();
        assert_eq!(kind, CheckKind::Http);

        let kind: CheckKind = serde_json::from_str(r#""grpc""#).unwrap();
        assert_eq!(kind, CheckKind::Grpc);
    }
}
