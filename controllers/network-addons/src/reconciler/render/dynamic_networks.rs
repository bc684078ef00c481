//! Hot-plug controller for secondary network attachments.

use kube::api::DynamicObject;
use serde_json::json;

use crds::NetworkAddonsConfigSpec;

use super::{apply_placement, common_labels, infra_placement, pull_policy, RenderData};
use crate::error::ControllerError;

pub fn render(
    spec: &NetworkAddonsConfigSpec,
    data: &RenderData,
) -> Result<Option<Vec<DynamicObject>>, ControllerError> {
    if spec.dynamic_networks.is_none() {
        return Ok(None);
    }
    let namespace = &data.namespace;
    let labels = common_labels("dynamic-networks");
    let placement = infra_placement(spec);

    let service_account = json!({
        "apiVersion": "v1",
        "kind": "ServiceAccount",
        "metadata": {
            "name": "dynamic-networks-controller",
            "namespace": namespace,
            "labels": labels.clone(),
        },
    });

    let mut pod_spec = json!({
        "serviceAccountName": "dynamic-networks-controller",
        "containers": [{
            "name": "controller",
            "image": data.images.dynamic_networks,
            "imagePullPolicy": pull_policy(spec),
            "command": ["/dynamic-networks-controller"],
            "resources": {
                "requests": { "cpu": "10m", "memory": "50Mi" },
            },
        }],
    });
    apply_placement(&mut pod_spec, &placement);

    let deployment = json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "name": "dynamic-networks-controller",
            "namespace": namespace,
            "labels": labels,
        },
        "spec": {
            "replicas": 1,
            "selector": { "matchLabels": { "app": "dynamic-networks" } },
            "template": {
                "metadata": { "labels": { "app": "dynamic-networks" } },
                "spec": pod_spec,
            },
        },
    });

    let objects = [service_account, deployment]
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<DynamicObject>, _>>()?;
    Ok(Some(objects))
}
