//! Defaulting with carry-forward.
//!
//! Optional settings left unset take the previously applied value first
//! and only then the hard-coded default, so an upgrade never silently
//! reverts an explicit choice that has since left the user's manifest.

use std::collections::BTreeMap;

use crds::{
    ImagePullPolicy, NetworkAddonsConfigSpec, Placement, PlacementConfiguration,
    SelfSignConfiguration,
};

pub const DEFAULT_MAC_RANGE_START: &str = "02:00:00:00:00:00";
pub const DEFAULT_MAC_RANGE_END: &str = "02:FF:FF:FF:FF:FF";

/// Fills every unset optional setting in `spec`. Returns error messages
/// in the same shape as the other pipeline steps; defaulting itself has
/// no failure modes today.
pub fn fill_defaults(
    spec: &mut NetworkAddonsConfigSpec,
    previous: Option<&NetworkAddonsConfigSpec>,
) -> Vec<String> {
    if spec.image_pull_policy.is_none() {
        spec.image_pull_policy = previous
            .and_then(|p| p.image_pull_policy)
            .or(Some(ImagePullPolicy::default()));
    }

    if let Some(mac_pool) = &mut spec.mac_pool {
        if mac_pool.range_start.is_none() && mac_pool.range_end.is_none() {
            let carried = previous
                .and_then(|p| p.mac_pool.as_ref())
                .filter(|p| p.range_start.is_some() && p.range_end.is_some());
            match carried {
                Some(prev) => {
                    mac_pool.range_start = prev.range_start.clone();
                    mac_pool.range_end = prev.range_end.clone();
                }
                None => {
                    mac_pool.range_start = Some(DEFAULT_MAC_RANGE_START.to_owned());
                    mac_pool.range_end = Some(DEFAULT_MAC_RANGE_END.to_owned());
                }
            }
        }
    }

    let self_sign_unset = match &spec.self_sign_configuration {
        None => true,
        Some(cfg) => *cfg == SelfSignConfiguration::default(),
    };
    if self_sign_unset {
        spec.self_sign_configuration = previous
            .and_then(|p| p.self_sign_configuration.clone())
            .filter(|p| *p != SelfSignConfiguration::default())
            .or_else(|| Some(default_self_sign()));
    }

    if spec.placement_configuration.is_none() {
        spec.placement_configuration = previous
            .and_then(|p| p.placement_configuration.clone())
            .or_else(|| Some(default_placement()));
    }

    Vec::new()
}

/// Rotation schedule used when the user configures none. The intervals
/// satisfy the ordering constraints the validators enforce.
fn default_self_sign() -> SelfSignConfiguration {
    SelfSignConfiguration {
        ca_rotate_interval: Some("48h".to_owned()),
        ca_overlap_interval: Some("24h".to_owned()),
        cert_rotate_interval: Some("24h".to_owned()),
        cert_overlap_interval: Some("12h".to_owned()),
    }
}

fn default_placement() -> PlacementConfiguration {
    PlacementConfiguration {
        infra: Some(Placement::default()),
        workloads: Some(Placement {
            node_selector: BTreeMap::from([(
                "kubernetes.io/os".to_owned(),
                "linux".to_owned(),
            )]),
            tolerations: vec![serde_json::json!({ "operator": "Exists" })],
            affinity: None,
        }),
    }
}
