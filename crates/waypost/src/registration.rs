//! Registration request construction
//!
//! Translates a [`ServiceIdentity`] plus a resolved [`CheckConfig`] into the
//! JSON payload the agent's `/v1/agent/service/register` endpoint expects.
//! Requests are built fresh for every registration call and never mutated
//! after construction.

use std::time::Duration;

use serde::Serialize;

use crate::config::{CheckConfig, CheckKind};
use crate::identity::ServiceIdentity;

/// Service registration payload in the agent's wire format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRegistration {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub address: String,
    pub port: u16,
    pub check: AgentCheck,
}

/// Health-check descriptor attached to a registration
///
/// Exactly one of the HTTP and gRPC targets is present, matching the
/// configured check kind; the other is omitted from the serialized payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentCheck {
    #[serde(rename = "HTTP", skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,
    #[serde(rename = "GRPC", skip_serializing_if = "Option::is_none")]
    pub grpc: Option<String>,
    pub timeout: String,
    pub interval: String,
    pub deregister_critical_service_after: String,
}

impl ServiceRegistration {
    /// Build a registration request from an identity and a resolved config
    ///
    /// The service name doubles as the registration ID and the sole tag;
    /// collisions within the backend are a caller responsibility.
    pub fn build(identity: &ServiceIdentity, config: &CheckConfig) -> Self {
        let health_url = config.health_url().to_string();
        let (http, grpc) = match config.kind {
            CheckKind::Http => (Some(health_url), None),
            CheckKind::Grpc => (None, Some(health_url)),
        };

        Self {
            id: identity.name.clone(),
            name: identity.name.clone(),
            tags: vec![identity.name.clone()],
            address: identity.host.clone(),
            port: identity.port,
            check: AgentCheck {
                http,
                grpc,
                timeout: duration_text(config.timeout),
                interval: duration_text(config.interval),
                deregister_critical_service_after: duration_text(config.deregister_after),
            },
        }
    }
}

/// Render a duration in the agent's duration text form ("3s", "500ms")
fn duration_text(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        format!("{}s", duration.as_secs())
    } else if duration.subsec_nanos() % 1_000_000 == 0 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{}us", duration.as_micros())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckOption;

    fn identity() -> ServiceIdentity {
        ServiceIdentity::new("svc", "h", 9000).unwrap()
    }

    #[test]
    fn test_duration_text() {
        assert_eq!(duration_text(Duration::from_secs(3)), "3s");
        assert_eq!(duration_text(Duration::from_secs(90)), "90s");
        assert_eq!(duration_text(Duration::from_millis(500)), "500ms");
        assert_eq!(duration_text(Duration::from_millis(1500)), "1500ms");
        assert_eq!(duration_text(Duration::from_micros(250)), "250us");
    }

    #[test]
    fn test_build_http_check() {
        let config = CheckConfig::resolve("h", 9000, [CheckOption::Kind(CheckKind::Http)]);
        let registration = ServiceRegistration::build(&identity(), &config);

        assert_eq!(registration.id, "svc");
        assert_eq!(registration.name, "svc");
        assert_eq!(registration.tags, vec!["svc".to_string()]);
        assert_eq!(registration.address, "h");
        assert_eq!(registration.port, 9000);
        assert_eq!(registration.check.http.as_deref(), Some("http://h:9000/health"));
        assert!(registration.check.grpc.is_none());
    }

    #[test]
    fn test_build_grpc_check() {
        let config = CheckConfig::resolve("h", 9000, []);
        let registration = ServiceRegistration::build(&identity(), &config);

        assert_eq!(
            registration.check.grpc.as_deref(),
            Some("h:9000/grpc.health.v1.Health")
        );
        assert!(registration.check.http.is_none());
    }

    #[test]
    fn test_wire_format() {
        let config = CheckConfig::resolve("h", 9000, [CheckOption::Kind(CheckKind::Http)]);
        let registration = ServiceRegistration::build(&identity(), &config);
        let value = serde_json::to_value(&registration).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "ID": "svc",
                "Name": "svc",
                "Tags": ["svc"],
                "Address": "h",
                "Port": 9000,
                "Check": {
                    "HTTP": "http://h:9000/health",
                    "Timeout": "3s",
                    "Interval": "11s",
                    "DeregisterCriticalServiceAfter": "3s"
                }
            })
        );
    }

    #[test]
    fn test_wire_format_omits_unused_check_field() {
        let config = CheckConfig::resolve("h", 9000, []);
        let registration = ServiceRegistration::build(&identity(), &config);
        let value = serde_json::to_value(&registration).unwrap();

        let check = value.get("Check").unwrap();
        assert!(check.get("GRPC").is_some());
        assert!(check.get("HTTP").is_none());
    }
}
