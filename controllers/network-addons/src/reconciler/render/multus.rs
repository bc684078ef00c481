//! Multus meta CNI plugin objects.

use kube::api::DynamicObject;
use serde_json::json;

use crds::NetworkAddonsConfigSpec;

use super::{apply_placement, common_labels, pull_policy, workloads_placement, RenderData};
use crate::error::ControllerError;

/// Host directory the kubelet loads CNI binaries from. Platform
/// generation 4 relocated it off the read-only root filesystem.
fn cni_bin_dir(platform_version: &str) -> &'static str {
    if platform_version.starts_with("4.") {
        "/var/lib/cni/bin"
    } else {
        "/opt/cni/bin"
    }
}

pub fn render(
    spec: &NetworkAddonsConfigSpec,
    data: &RenderData,
) -> Result<Option<Vec<DynamicObject>>, ControllerError> {
    if spec.multus.is_none() {
        return Ok(None);
    }
    let namespace = &data.namespace;
    let labels = common_labels("multus");
    let placement = workloads_placement(spec);

    let crd = json!({
        "apiVersion": "apiextensions.k8s.io/v1",
        "kind": "CustomResourceDefinition",
        "metadata": {
            "name": "network-attachment-definitions.k8s.cni.cncf.io",
            "labels": labels.clone(),
        },
        "spec": {
            "group": "k8s.cni.cncf.io",
            "scope": "Namespaced",
            "names": {
                "plural": "network-attachment-definitions",
                "singular": "network-attachment-definition",
                "kind": "NetworkAttachmentDefinition",
                "shortNames": ["net-attach-def"],
            },
            "versions": [{
                "name": "v1",
                "served": true,
                "storage": true,
                "schema": {
                    "openAPIV3Schema": {
                        "type": "object",
                        "properties": {
                            "spec": {
                                "type": "object",
                                "properties": {
                                    "config": { "type": "string" },
                                },
                            },
                        },
                    },
                },
            }],
        },
    });

    let service_account = json!({
        "apiVersion": "v1",
        "kind": "ServiceAccount",
        "metadata": { "name": "multus", "namespace": namespace, "labels": labels.clone() },
    });

    let cluster_role = json!({
        "apiVersion": "rbac.authorization.k8s.io/v1",
        "kind": "ClusterRole",
        "metadata": { "name": "multus", "labels": labels.clone() },
        "rules": [
            {
                "apiGroups": ["k8s.cni.cncf.io"],
                "resources": ["*"],
                "verbs": ["get", "list", "watch"],
            },
            {
                "apiGroups": [""],
                "resources": ["pods", "pods/status"],
                "verbs": ["get", "list", "update", "watch"],
            },
            {
                "apiGroups": ["events.k8s.io"],
                "resources": ["events"],
                "verbs": ["create", "patch", "update"],
            },
        ],
    });

    let cluster_role_binding = json!({
        "apiVersion": "rbac.authorization.k8s.io/v1",
        "kind": "ClusterRoleBinding",
        "metadata": { "name": "multus", "labels": labels.clone() },
        "roleRef": {
            "apiGroup": "rbac.authorization.k8s.io",
            "kind": "ClusterRole",
            "name": "multus",
        },
        "subjects": [
            { "kind": "ServiceAccount", "name": "multus", "namespace": namespace },
        ],
    });

    let mut pod_spec = json!({
        "hostNetwork": true,
        "serviceAccountName": "multus",
        "priorityClassName": "system-node-critical",
        "containers": [{
            "name": "kube-multus",
            "image": data.images.multus,
            "imagePullPolicy": pull_policy(spec),
            "command": ["/thin_entrypoint"],
            "args": ["--multus-conf-file=auto", "--cni-version=0.3.1"],
            "securityContext": { "privileged": true },
            "resources": {
                "requests": { "cpu": "10m", "memory": "65Mi" },
            },
            "volumeMounts": [
                { "name": "cni", "mountPath": "/host/etc/cni/net.d" },
                { "name": "cnibin", "mountPath": "/host/opt/cni/bin" },
            ],
        }],
        "volumes": [
            { "name": "cni", "hostPath": { "path": "/etc/cni/net.d" } },
            { "name": "cnibin", "hostPath": { "path": cni_bin_dir(&data.facts.platform_version) } },
        ],
    });
    apply_placement(&mut pod_spec, &placement);

    let daemon_set = json!({
        "apiVersion": "apps/v1",
        "kind": "DaemonSet",
        "metadata": { "name": "kube-multus-ds", "namespace": namespace, "labels": labels },
        "spec": {
            "selector": { "matchLabels": { "app": "multus" } },
            "updateStrategy": { "type": "RollingUpdate" },
            "template": {
                "metadata": { "labels": { "app": "multus" } },
                "spec": pod_spec,
            },
        },
    });

    let objects = [crd, service_account, cluster_role, cluster_role_binding, daemon_set]
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<DynamicObject>, _>>()?;
    Ok(Some(objects))
}
