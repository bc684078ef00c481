//! Per-kind merge policies, run before every update.
//!
//! `merge_for_update(current, desired)` produces the object actually sent
//! to the API server. The generic rule carries current's server-assigned
//! metadata onto desired and unions labels/annotations with desired winning
//! on conflict; a small table keyed by (group, kind) adds the fields the
//! server or other controllers own for that kind.

use std::collections::HashMap;

use kube::api::DynamicObject;
use serde_json::Value;

use crate::error::ApplyError;
use crate::object::gvk_of;
use crate::paths::{self, PathError};

/// Metadata the server assigns; always taken from the live object.
const SERVER_METADATA_FIELDS: [&str; 5] = [
    "creationTimestamp",
    "uid",
    "resourceVersion",
    "selfLink",
    "generation",
];

/// Written by the deployment controller, never by us.
const REVISION_ANNOTATION: &str = "deployment.kubernetes.io/revision";

pub fn merge_for_update(
    current: &DynamicObject,
    desired: &DynamicObject,
) -> Result<DynamicObject, ApplyError> {
    let gvk = gvk_of(desired)?;
    let cur = serde_json::to_value(current)?;
    let mut merged = serde_json::to_value(desired)?;

    merge_metadata(&cur, &mut merged)?;

    match (gvk.group.as_str(), gvk.kind.as_str()) {
        ("apps", "Deployment") => {
            carry_field(&cur, &mut merged, &["metadata", "annotations", REVISION_ANNOTATION])?;
        }
        ("", "Service") => {
            carry_field(&cur, &mut merged, &["spec", "clusterIP"])?;
        }
        ("", "ServiceAccount") => {
            carry_field(&cur, &mut merged, &["secrets"])?;
        }
        (
            "admissionregistration.k8s.io",
            "MutatingWebhookConfiguration" | "ValidatingWebhookConfiguration",
        ) => {
            merge_webhook_ca_bundles(&cur, &mut merged)?;
        }
        _ => {}
    }

    Ok(serde_json::from_value(merged)?)
}

fn merge_metadata(cur: &Value, merged: &mut Value) -> Result<(), ApplyError> {
    for field in SERVER_METADATA_FIELDS {
        carry_field(cur, merged, &["metadata", field])?;
    }
    union_keep_desired(cur, merged, &["metadata", "labels"])?;
    union_keep_desired(cur, merged, &["metadata", "annotations"])?;
    Ok(())
}

/// Force merged's value at `path` to current's; drop it when current has
/// none.
fn carry_field(cur: &Value, merged: &mut Value, path: &[&str]) -> Result<(), ApplyError> {
    match paths::get_opt(cur, path)? {
        Some(value) => paths::set_path(merged, path, value.clone())?,
        None => {
            paths::remove_path(merged, path)?;
        }
    }
    Ok(())
}

/// Union current's and merged's string map at `path`, merged's entries
/// winning on key conflict.
fn union_keep_desired(cur: &Value, merged: &mut Value, path: &[&str]) -> Result<(), ApplyError> {
    let Some(cur_value) = paths::get_opt(cur, path)? else {
        return Ok(());
    };
    let cur_map = cur_value.as_object().ok_or_else(|| PathError::WrongType {
        path: path.join("."),
        expected: "object",
    })?;

    let mut union = cur_map.clone();
    if let Some(desired_value) = paths::get_opt(merged, path)? {
        let desired_map = desired_value
            .as_object()
            .ok_or_else(|| PathError::WrongType {
                path: path.join("."),
                expected: "object",
            })?;
        for (key, value) in desired_map {
            union.insert(key.clone(), value.clone());
        }
    }

    paths::set_path(merged, path, Value::Object(union))?;
    Ok(())
}

/// The API server (or a cert manager) injects CA bundles into webhook
/// client configs after creation. Rendered manifests never carry one, so
/// copy each live bundle onto the matching desired webhook by name.
fn merge_webhook_ca_bundles(cur: &Value, merged: &mut Value) -> Result<(), ApplyError> {
    let bundles: HashMap<String, Value> = cur
        .get("webhooks")
        .and_then(Value::as_array)
        .map(|hooks| {
            hooks
                .iter()
                .filter_map(|hook| {
                    let name = hook.get("name")?.as_str()?;
                    let bundle = hook.get("clientConfig")?.get("caBundle")?;
                    Some((name.to_owned(), bundle.clone()))
                })
                .collect()
        })
        .unwrap_or_default();

    let Some(merged_hooks) = merged.get_mut("webhooks").and_then(Value::as_array_mut) else {
        return Ok(());
    };

    for hook in merged_hooks {
        let Some(name) = hook.get("name").and_then(Value::as_str).map(str::to_owned) else {
            continue;
        };
        let Some(bundle) = bundles.get(&name) else {
            continue;
        };
        if paths::get_opt(hook, &["clientConfig", "caBundle"])?.is_none() {
            paths::set_path(hook, &["clientConfig", "caBundle"], bundle.clone())?;
        }
    }
    Ok(())
}

/// Compare two objects ignoring `status` and server-side field tracking.
/// Used after a merge: when the merged object equals the live one there is
/// nothing to update.
pub fn semantically_equal(a: &DynamicObject, b: &DynamicObject) -> Result<bool, ApplyError> {
    Ok(strip_volatile(serde_json::to_value(a)?) == strip_volatile(serde_json::to_value(b)?))
}

fn strip_volatile(mut value: Value) -> Value {
    paths::remove_path(&mut value, &["status"]).ok();
    paths::remove_path(&mut value, &["metadata", "managedFields"]).ok();
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> DynamicObject {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn merge_carries_server_assigned_metadata() {
        let current = object(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {
                "name": "c",
                "namespace": "ns",
                "uid": "11-22",
                "resourceVersion": "7",
                "creationTimestamp": "2024-01-01T00:00:00Z",
                "generation": 3,
            },
            "data": {"applied": "{}"},
        }));
        let desired = object(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "c", "namespace": "ns"},
            "data": {"applied": "{}"},
        }));

        let merged = merge_for_update(&current, &desired).unwrap();
        let merged = serde_json::to_value(&merged).unwrap();

        assert_eq!(merged["metadata"]["uid"], "11-22");
        assert_eq!(merged["metadata"]["resourceVersion"], "7");
        assert_eq!(merged["metadata"]["creationTimestamp"], "2024-01-01T00:00:00Z");
        assert_eq!(merged["metadata"]["generation"], 3);
    }

    #[test]
    fn label_union_keeps_foreign_keys_and_desired_wins_conflicts() {
        let current = object(json!({
            "apiVersion": "v1",
            "kind": "ServiceAccount",
            "metadata": {
                "name": "sa",
                "namespace": "ns",
                "labels": {"injected-by-admission": "yes", "tier": "old"},
            },
        }));
        let desired = object(json!({
            "apiVersion": "v1",
            "kind": "ServiceAccount",
            "metadata": {"name": "sa", "namespace": "ns", "labels": {"tier": "new"}},
        }));

        let merged = merge_for_update(&current, &desired).unwrap();
        let labels = merged.metadata.labels.unwrap();

        assert_eq!(labels.get("injected-by-admission").map(String::as_str), Some("yes"));
        assert_eq!(labels.get("tier").map(String::as_str), Some("new"));
    }

    #[test]
    fn deployment_merge_keeps_live_revision_annotation() {
        let current = object(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {
                "name": "d",
                "namespace": "ns",
                "annotations": {"deployment.kubernetes.io/revision": "5"},
            },
            "spec": {"replicas": 2},
        }));
        let desired = object(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "d", "namespace": "ns"},
            "spec": {"replicas": 2},
        }));

        let merged = merge_for_update(&current, &desired).unwrap();
        let annotations = merged.metadata.annotations.unwrap();
        assert_eq!(
            annotations.get("deployment.kubernetes.io/revision").map(String::as_str),
            Some("5")
        );
    }

    #[test]
    fn deployment_merge_discards_desired_revision_annotation() {
        let current = object(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {
                "name": "d",
                "namespace": "ns",
                "annotations": {"deployment.kubernetes.io/revision": "5"},
            },
            "spec": {},
        }));
        let desired = object(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {
                "name": "d",
                "namespace": "ns",
                "annotations": {"deployment.kubernetes.io/revision": "999"},
            },
            "spec": {},
        }));

        let merged = merge_for_update(&current, &desired).unwrap();
        let annotations = merged.metadata.annotations.unwrap();
        assert_eq!(
            annotations.get("deployment.kubernetes.io/revision").map(String::as_str),
            Some("5")
        );
    }

    #[test]
    fn service_merge_always_keeps_live_cluster_ip() {
        let current = object(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {"name": "s", "namespace": "ns"},
            "spec": {"clusterIP": "10.96.0.17", "ports": [{"port": 443}]},
        }));
        let desired = object(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {"name": "s", "namespace": "ns"},
            "spec": {"clusterIP": "10.96.99.99", "ports": [{"port": 443}]},
        }));

        let merged = merge_for_update(&current, &desired).unwrap();
        let merged = serde_json::to_value(&merged).unwrap();
        assert_eq!(merged["spec"]["clusterIP"], "10.96.0.17");
    }

    #[test]
    fn service_account_merge_preserves_generated_secrets() {
        let current = object(json!({
            "apiVersion": "v1",
            "kind": "ServiceAccount",
            "metadata": {"name": "sa", "namespace": "ns"},
            "secrets": [{"name": "sa-token-x7k2p"}],
        }));
        let desired = object(json!({
            "apiVersion": "v1",
            "kind": "ServiceAccount",
            "metadata": {"name": "sa", "namespace": "ns"},
        }));

        let merged = merge_for_update(&current, &desired).unwrap();
        let merged = serde_json::to_value(&merged).unwrap();
        assert_eq!(merged["secrets"][0]["name"], "sa-token-x7k2p");
    }

    #[test]
    fn webhook_merge_copies_ca_bundle_for_matching_names_only() {
        let current = object(json!({
            "apiVersion": "admissionregistration.k8s.io/v1",
            "kind": "MutatingWebhookConfiguration",
            "metadata": {"name": "mac-pool"},
            "webhooks": [
                {
                    "name": "mutatepods.example.io",
                    "clientConfig": {"caBundle": "TElWRQ==", "service": {"name": "svc"}},
                },
                {"name": "other.example.io", "clientConfig": {"service": {"name": "svc"}}},
            ],
        }));
        let desired = object(json!({
            "apiVersion": "admissionregistration.k8s.io/v1",
            "kind": "MutatingWebhookConfiguration",
            "metadata": {"name": "mac-pool"},
            "webhooks": [
                {"name": "mutatepods.example.io", "clientConfig": {"service": {"name": "svc"}}},
                {
                    "name": "fresh.example.io",
                    "clientConfig": {"caBundle": "REVTSVJFRA==", "service": {"name": "svc"}},
                },
            ],
        }));

        let merged = merge_for_update(&current, &desired).unwrap();
        let merged = serde_json::to_value(&merged).unwrap();

        assert_eq!(merged["webhooks"][0]["clientConfig"]["caBundle"], "TElWRQ==");
        assert_eq!(merged["webhooks"][1]["clientConfig"]["caBundle"], "REVTSVJFRA==");
    }

    #[test]
    fn merged_object_compares_equal_to_live_when_nothing_changed() {
        let current = object(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {
                "name": "c",
                "namespace": "ns",
                "uid": "u",
                "resourceVersion": "3",
                "labels": {"app": "x"},
            },
            "data": {"k": "v"},
        }));
        let desired = object(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "c", "namespace": "ns", "labels": {"app": "x"}},
            "data": {"k": "v"},
        }));

        let merged = merge_for_update(&current, &desired).unwrap();
        assert!(semantically_equal(&merged, &current).unwrap());
    }

    #[test]
    fn semantic_compare_ignores_status() {
        let a = object(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "d", "namespace": "ns"},
            "spec": {"replicas": 1},
            "status": {"availableReplicas": 1},
        }));
        let b = object(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "d", "namespace": "ns"},
            "spec": {"replicas": 1},
        }));

        assert!(semantically_equal(&a, &b).unwrap());
    }
}
