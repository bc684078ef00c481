//! Node placement knobs shared by every operand.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Placement split by operand class. `infra` covers cluster-singleton
/// deployments (webhooks, controllers), `workloads` covers per-node daemon
/// sets that must run wherever pods attach to secondary networks.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlacementConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infra: Option<Placement>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workloads: Option<Placement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,

    /// Raw v1 Toleration objects, passed through to pod specs unmodified.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tolerations: Vec<serde_json::Value>,

    /// Raw v1 Affinity object, passed through to pod specs unmodified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affinity: Option<serde_json::Value>,
}

impl Placement {
    pub fn is_empty(&self) -> bool {
        self.node_selector.is_empty() && self.tolerations.is_empty() && self.affinity.is_none()
    }
}
