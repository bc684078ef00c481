//! Linux bridge CNI plugin and bridge marker objects.

use kube::api::DynamicObject;
use serde_json::json;

use crds::NetworkAddonsConfigSpec;

use super::{apply_placement, common_labels, pull_policy, workloads_placement, RenderData};
use crate::error::ControllerError;

pub fn render(
    spec: &NetworkAddonsConfigSpec,
    data: &RenderData,
) -> Result<Option<Vec<DynamicObject>>, ControllerError> {
    if spec.linux_bridge.is_none() {
        return Ok(None);
    }
    let namespace = &data.namespace;
    let labels = common_labels("linux-bridge");
    let placement = workloads_placement(spec);
    let policy = pull_policy(spec);

    let service_account = json!({
        "apiVersion": "v1",
        "kind": "ServiceAccount",
        "metadata": { "name": "linux-bridge", "namespace": namespace, "labels": labels.clone() },
    });

    let mut pod_spec = json!({
        "hostNetwork": true,
        "serviceAccountName": "linux-bridge",
        "priorityClassName": "system-node-critical",
        "containers": [
            {
                "name": "cni-plugins",
                "image": data.images.linux_bridge_cni,
                "imagePullPolicy": policy,
                // Installs the bridge and tuning binaries, then parks so
                // the kubelet keeps the pod alive for upgrades.
                "command": ["/bin/sh", "-ce"],
                "args": ["cp -f /usr/src/containernetworking/plugins/bin/bridge /usr/src/containernetworking/plugins/bin/tuning /opt/cni/bin && sleep infinity"],
                "securityContext": { "privileged": true },
                "resources": {
                    "requests": { "cpu": "10m", "memory": "15Mi" },
                },
                "volumeMounts": [
                    { "name": "cnibin", "mountPath": "/opt/cni/bin" },
                ],
            },
            {
                "name": "bridge-marker",
                "image": data.images.bridge_marker,
                "imagePullPolicy": policy,
                "args": ["-node-name", "$(NODE_NAME)"],
                "env": [
                    {
                        "name": "NODE_NAME",
                        "valueFrom": { "fieldRef": { "fieldPath": "spec.nodeName" } },
                    },
                ],
                "resources": {
                    "requests": { "cpu": "10m", "memory": "15Mi" },
                },
            },
        ],
        "volumes": [
            { "name": "cnibin", "hostPath": { "path": "/opt/cni/bin" } },
        ],
    });
    apply_placement(&mut pod_spec, &placement);

    let daemon_set = json!({
        "apiVersion": "apps/v1",
        "kind": "DaemonSet",
        "metadata": { "name": "bridge-plugin", "namespace": namespace, "labels": labels },
        "spec": {
            "selector": { "matchLabels": { "app": "linux-bridge" } },
            "updateStrategy": { "type": "RollingUpdate" },
            "template": {
                "metadata": { "labels": { "app": "linux-bridge" } },
                "spec": pod_spec,
            },
        },
    });

    let objects = [service_account, daemon_set]
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<DynamicObject>, _>>()?;
    Ok(Some(objects))
}
