//! NetworkAddonsConfig CRD
//!
//! The single cluster-scoped configuration record for the optional
//! networking add-on components. One instance named `cluster` is expected;
//! records with any other name are ignored by the controller.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::conditions::StatusCondition;
use crate::placement::PlacementConfiguration;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[kube(
    group = "networkaddons.microscaler.io",
    version = "v1alpha1",
    kind = "NetworkAddonsConfig",
    status = "NetworkAddonsConfigStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAddonsConfigSpec {
    /// Multus meta CNI plugin. Present means managed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multus: Option<MultusSpec>,

    /// Linux bridge CNI plugin and bridge marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linux_bridge: Option<LinuxBridgeSpec>,

    /// Cluster-wide MAC address pool manager.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_pool: Option<MacPoolSpec>,

    /// Hot-plug controller for secondary network attachments.
    /// Requires multus to be managed as well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_networks: Option<DynamicNetworksSpec>,

    /// Pull policy applied to every operand container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<ImagePullPolicy>,

    /// Node placement for infra and workload operands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement_configuration: Option<PlacementConfiguration>,

    /// Rotation schedule for the self-signed CA and service certificates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_sign_configuration: Option<SelfSignConfiguration>,

    /// TLS profile for operand webhooks and metrics endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_security_profile: Option<TlsSecurityProfile>,
}

/// Multus has no tunables; presence alone enables it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub struct MultusSpec {}

/// Linux bridge has no tunables; presence alone enables it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub struct LinuxBridgeSpec {}

/// Hot-plug networks controller has no tunables; presence alone enables it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub struct DynamicNetworksSpec {}

/// MAC pool boundaries. Both ends must be given together; when neither is
/// given the controller fills a default locally-administered range.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MacPoolSpec {
    /// First address of the pool, e.g. "02:00:00:00:00:00".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_start: Option<String>,

    /// Last address of the pool, inclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_end: Option<String>,
}

/// Container image pull policy, matching the Kubernetes spelling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub enum ImagePullPolicy {
    Always,
    #[default]
    IfNotPresent,
    Never,
}

impl ImagePullPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImagePullPolicy::Always => "Always",
            ImagePullPolicy::IfNotPresent => "IfNotPresent",
            ImagePullPolicy::Never => "Never",
        }
    }
}

/// Certificate rotation schedule. Either all four intervals are set or none
/// is; intervals are Go-style duration strings ("48h", "1h30m").
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelfSignConfiguration {
    /// How often the CA certificate is reissued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_rotate_interval: Option<String>,

    /// How long the outgoing CA overlaps the new one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_overlap_interval: Option<String>,

    /// How often service certificates are reissued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_rotate_interval: Option<String>,

    /// How long outgoing service certificates overlap their replacements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_overlap_interval: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TlsSecurityProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<TlsProfileName>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub enum TlsProfileName {
    Old,
    #[default]
    Intermediate,
    Modern,
}

impl TlsProfileName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TlsProfileName::Old => "old",
            TlsProfileName::Intermediate => "intermediate",
            TlsProfileName::Modern => "modern",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAddonsConfigStatus {
    /// Version of the add-ons currently running, set once available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_version: Option<String>,

    /// Version the controller is converging towards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_version: Option<String>,

    /// Version of the controller itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_version: Option<String>,

    /// Leveled condition output (Available/Progressing/Degraded).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<StatusCondition>,

    /// Operand containers deployed by the last successful apply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<DeployedContainer>,

    /// Generation of the spec that produced this status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

/// One operand container, reported for inventory/debugging.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeployedContainer {
    pub namespace: String,
    pub parent_kind: String,
    pub parent_name: String,
    pub name: String,
    pub image: String,
}
