//! Cluster environment facts.
//!
//! The operator deployment injects what the controller cannot cheaply
//! discover at runtime: platform version, optional API availability and
//! sizing hints. Everything here is read once at startup.

use std::env;

/// Facts about the hosting cluster that influence rendering and
/// validation.
#[derive(Debug, Clone, Default)]
pub struct ClusterFacts {
    /// Kubernetes server version, e.g. "1.30".
    pub platform_version: String,

    /// Whether the SecurityContextConstraints API is served.
    pub scc_available: bool,

    /// Whether a monitoring stack able to scrape operand metrics is present.
    pub monitoring_available: bool,

    /// Single-node clusters run one replica of each infra deployment.
    pub single_replica: bool,

    /// Set when the platform already manages MAC assignment; the managed
    /// MAC pool must not be enabled alongside it.
    pub external_mac_management: bool,
}

impl ClusterFacts {
    /// Reads facts from the process environment. Missing variables fall
    /// back to the most conservative value.
    pub fn from_env() -> Self {
        Self {
            platform_version: env::var("PLATFORM_VERSION").unwrap_or_default(),
            scc_available: bool_env("SCC_AVAILABLE"),
            monitoring_available: bool_env("MONITORING_AVAILABLE"),
            single_replica: bool_env("SINGLE_REPLICA"),
            external_mac_management: bool_env("EXTERNAL_MAC_MANAGEMENT"),
        }
    }
}

fn bool_env(key: &str) -> bool {
    env::var(key).map(|v| parse_bool(&v)).unwrap_or(false)
}

/// Accepts the spellings downward-API and shell conventions produce
/// for booleans.
fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
