//! Manifest rendering.
//!
//! Each component renderer receives the fully defaulted spec plus
//! cluster facts and returns its object set, or skips when the
//! component is not requested. The rendered order is fixed: the
//! applied-configuration record first, then each component's objects.

pub mod dynamic_networks;
pub mod linux_bridge;
pub mod mac_pool;
pub mod multus;

use std::env;

use kube::api::DynamicObject;
use serde_json::{json, Value};

use crds::{NetworkAddonsConfigSpec, Placement};

use crate::error::ControllerError;
use crate::facts::ClusterFacts;
use crate::reconciler::applied;

/// Operand container images, overridable per component through the
/// environment for disconnected installs and image mirroring.
#[derive(Debug, Clone)]
pub struct Images {
    pub multus: String,
    pub linux_bridge_cni: String,
    pub bridge_marker: String,
    pub mac_pool: String,
    pub dynamic_networks: String,
}

impl Images {
    pub fn from_env() -> Self {
        Self {
            multus: image_env(
                "MULTUS_IMAGE",
                "ghcr.io/k8snetworkplumbingwg/multus-cni:v4.0.2",
            ),
            linux_bridge_cni: image_env(
                "LINUX_BRIDGE_IMAGE",
                "quay.io/kubevirt/cni-default-plugins:v0.9.5",
            ),
            bridge_marker: image_env(
                "BRIDGE_MARKER_IMAGE",
                "quay.io/kubevirt/bridge-marker:v0.56.0",
            ),
            mac_pool: image_env("MAC_POOL_IMAGE", "quay.io/kubevirt/kubemacpool:v0.44.0"),
            dynamic_networks: image_env(
                "DYNAMIC_NETWORKS_IMAGE",
                "ghcr.io/k8snetworkplumbingwg/multus-dynamic-networks-controller:v0.3.7",
            ),
        }
    }
}

fn image_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Inputs shared by every component renderer.
#[derive(Debug, Clone)]
pub struct RenderData {
    pub namespace: String,
    pub images: Images,
    pub facts: ClusterFacts,
}

/// Labels stamped on every rendered object.
pub(crate) fn common_labels(component: &str) -> Value {
    json!({
        "app.kubernetes.io/part-of": "network-addons-operator",
        "app.kubernetes.io/component": component,
    })
}

/// Pull policy after defaulting; falls back for specs rendered before
/// the pipeline ran (removal rendering of old records).
pub(crate) fn pull_policy(spec: &NetworkAddonsConfigSpec) -> &'static str {
    spec.image_pull_policy.unwrap_or_default().as_str()
}

pub(crate) fn workloads_placement(spec: &NetworkAddonsConfigSpec) -> Placement {
    spec.placement_configuration
        .as_ref()
        .and_then(|placement| placement.workloads.clone())
        .unwrap_or_default()
}

pub(crate) fn infra_placement(spec: &NetworkAddonsConfigSpec) -> Placement {
    spec.placement_configuration
        .as_ref()
        .and_then(|placement| placement.infra.clone())
        .unwrap_or_default()
}

/// Merges placement into a pod spec value. Empty selector and
/// toleration lists are left off the manifest entirely.
pub(crate) fn apply_placement(pod_spec: &mut Value, placement: &Placement) {
    if !placement.node_selector.is_empty() {
        pod_spec["nodeSelector"] = json!(placement.node_selector);
    }
    if !placement.tolerations.is_empty() {
        pod_spec["tolerations"] = Value::Array(placement.tolerations.clone());
    }
    if let Some(affinity) = &placement.affinity {
        pod_spec["affinity"] = affinity.clone();
    }
}

/// Renders the complete desired object set for `spec`, the
/// applied-configuration record first.
pub fn render_all(
    spec: &NetworkAddonsConfigSpec,
    data: &RenderData,
    config_name: &str,
) -> Result<Vec<DynamicObject>, ControllerError> {
    let mut objects = vec![applied::render_applied(spec, &data.namespace, config_name)?];
    let components = [
        multus::render(spec, data)?,
        linux_bridge::render(spec, data)?,
        mac_pool::render(spec, data)?,
        dynamic_networks::render(spec, data)?,
    ];
    for rendered in components {
        if let Some(component_objects) = rendered {
            objects.extend(component_objects);
        }
    }
    Ok(objects)
}

/// Kinds that outlive any single component and are never deleted during
/// removal. The namespace hosts other components; CRDs own user data.
fn is_protected_kind(obj: &DynamicObject) -> bool {
    matches!(
        obj.types.as_ref().map(|types| types.kind.as_str()),
        Some("Namespace") | Some("CustomResourceDefinition")
    )
}

/// Objects belonging to components present in `previous` but dropped
/// from `next`, rendered from the previous spec so names and shapes
/// match what was deployed.
pub fn objects_to_remove(
    previous: &NetworkAddonsConfigSpec,
    next: &NetworkAddonsConfigSpec,
    data: &RenderData,
) -> Result<Vec<DynamicObject>, ControllerError> {
    let mut removed = Vec::new();
    if previous.multus.is_some() && next.multus.is_none() {
        removed.extend(multus::render(previous, data)?.unwrap_or_default());
    }
    if previous.linux_bridge.is_some() && next.linux_bridge.is_none() {
        removed.extend(linux_bridge::render(previous, data)?.unwrap_or_default());
    }
    if previous.mac_pool.is_some() && next.mac_pool.is_none() {
        removed.extend(mac_pool::render(previous, data)?.unwrap_or_default());
    }
    if previous.dynamic_networks.is_some() && next.dynamic_networks.is_none() {
        removed.extend(dynamic_networks::render(previous, data)?.unwrap_or_default());
    }
    removed.retain(|obj| !is_protected_kind(obj));
    Ok(removed)
}
