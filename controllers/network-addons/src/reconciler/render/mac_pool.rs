//! MAC address pool manager objects.
//!
//! The manager runs as an admission webhook that stamps unique MAC
//! addresses onto pods attaching to secondary networks. Its certificate
//! secret is rendered empty once and then owned by the manager's
//! rotation loop.

use kube::api::DynamicObject;
use serde_json::json;

use crds::{NetworkAddonsConfigSpec, IGNORE_ERRORS_ANNOTATION};

use super::{apply_placement, common_labels, infra_placement, pull_policy, RenderData};
use crate::error::ControllerError;

pub fn render(
    spec: &NetworkAddonsConfigSpec,
    data: &RenderData,
) -> Result<Option<Vec<DynamicObject>>, ControllerError> {
    let Some(mac_pool) = &spec.mac_pool else {
        return Ok(None);
    };
    let namespace = &data.namespace;
    let labels = common_labels("mac-pool");
    let placement = infra_placement(spec);

    let service_account = json!({
        "apiVersion": "v1",
        "kind": "ServiceAccount",
        "metadata": { "name": "mac-pool", "namespace": namespace, "labels": labels.clone() },
    });

    let mut env = vec![
        json!({ "name": "POD_NAMESPACE", "valueFrom": { "fieldRef": { "fieldPath": "metadata.namespace" } } }),
        json!({ "name": "RANGE_START", "value": mac_pool.range_start.clone().unwrap_or_default() }),
        json!({ "name": "RANGE_END", "value": mac_pool.range_end.clone().unwrap_or_default() }),
    ];
    if let Some(rotation) = &spec.self_sign_configuration {
        for (name, value) in [
            ("CA_ROTATE_INTERVAL", &rotation.ca_rotate_interval),
            ("CA_OVERLAP_INTERVAL", &rotation.ca_overlap_interval),
            ("CERT_ROTATE_INTERVAL", &rotation.cert_rotate_interval),
            ("CERT_OVERLAP_INTERVAL", &rotation.cert_overlap_interval),
        ] {
            if let Some(value) = value {
                env.push(json!({ "name": name, "value": value }));
            }
        }
    }
    if let Some(profile) = spec
        .tls_security_profile
        .as_ref()
        .and_then(|tls| tls.profile)
    {
        env.push(json!({ "name": "TLS_MIN_PROFILE", "value": profile.as_str() }));
    }

    let replicas = if data.facts.single_replica { 1 } else { 2 };
    let mut pod_spec = json!({
        "serviceAccountName": "mac-pool",
        "containers": [{
            "name": "manager",
            "image": data.images.mac_pool,
            "imagePullPolicy": pull_policy(spec),
            "args": ["--v=production"],
            "env": env,
            "ports": [
                { "name": "webhook-server", "containerPort": 8443, "protocol": "TCP" },
                { "name": "metrics", "containerPort": 8080, "protocol": "TCP" },
            ],
            "resources": {
                "requests": { "cpu": "30m", "memory": "30Mi" },
            },
            "volumeMounts": [
                { "name": "tls-key-pair", "readOnly": true, "mountPath": "/etc/webhook/certs" },
            ],
        }],
        "volumes": [
            { "name": "tls-key-pair", "secret": { "secretName": "mac-pool-cert" } },
        ],
    });
    apply_placement(&mut pod_spec, &placement);

    let deployment = json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": { "name": "mac-controller-manager", "namespace": namespace, "labels": labels.clone() },
        "spec": {
            "replicas": replicas,
            "selector": { "matchLabels": { "app": "mac-pool" } },
            "template": {
                "metadata": { "labels": { "app": "mac-pool" } },
                "spec": pod_spec,
            },
        },
    });

    let mut ports = vec![json!({
        "name": "webhook",
        "port": 443,
        "targetPort": "webhook-server",
        "protocol": "TCP",
    })];
    if data.facts.monitoring_available {
        ports.push(json!({
            "name": "metrics",
            "port": 8080,
            "targetPort": "metrics",
            "protocol": "TCP",
        }));
    }
    let service = json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": { "name": "mac-pool-service", "namespace": namespace, "labels": labels.clone() },
        "spec": {
            "selector": { "app": "mac-pool" },
            "ports": ports,
        },
    });

    let secret = json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": { "name": "mac-pool-cert", "namespace": namespace, "labels": labels.clone() },
        "type": "kubernetes.io/tls",
        "data": { "tls.crt": "", "tls.key": "" },
    });

    let webhook = json!({
        "apiVersion": "admissionregistration.k8s.io/v1",
        "kind": "MutatingWebhookConfiguration",
        "metadata": { "name": "mac-pool-mutator", "labels": labels.clone() },
        "webhooks": [{
            "name": "mutatepods.networkaddons.microscaler.io",
            "clientConfig": {
                "service": {
                    "name": "mac-pool-service",
                    "namespace": namespace,
                    "path": "/mutate-pods",
                },
            },
            "rules": [{
                "operations": ["CREATE"],
                "apiGroups": [""],
                "apiVersions": ["v1"],
                "resources": ["pods"],
            }],
            "failurePolicy": "Ignore",
            "sideEffects": "NoneOnDryRun",
            "admissionReviewVersions": ["v1"],
        }],
    });

    let mut objects = vec![service_account, deployment, service, secret, webhook];
    if data.facts.monitoring_available {
        // The monitoring stack may disappear out from under us, so the
        // monitor is marked as tolerating apply failures.
        let mut annotations = serde_json::Map::new();
        annotations.insert(IGNORE_ERRORS_ANNOTATION.to_owned(), json!("true"));
        objects.push(json!({
            "apiVersion": "monitoring.coreos.com/v1",
            "kind": "ServiceMonitor",
            "metadata": {
                "name": "mac-pool-metrics",
                "namespace": namespace,
                "labels": labels,
                "annotations": annotations,
            },
            "spec": {
                "selector": { "matchLabels": { "app": "mac-pool" } },
                "endpoints": [{ "port": "metrics" }],
            },
        }));
    }

    let objects = objects
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<DynamicObject>, _>>()?;
    Ok(Some(objects))
}
