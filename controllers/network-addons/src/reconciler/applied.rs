//! Previously-applied-configuration store.
//!
//! The last successfully applied spec is kept in a ConfigMap next to
//! the operands, one JSON document under the "applied" key. It feeds
//! defaulting carry-forward, the change-safety guard and removal
//! rendering.

use kube::api::DynamicObject;
use kube::core::GroupVersionKind;
use kube_apply::ObjectClient;
use serde_json::json;

use crds::NetworkAddonsConfigSpec;

use crate::error::ControllerError;

pub const APPLIED_NAME_PREFIX: &str = "network-addons-applied-";
pub const APPLIED_KEY: &str = "applied";

fn config_map_gvk() -> GroupVersionKind {
    GroupVersionKind::gvk("", "v1", "ConfigMap")
}

pub fn applied_name(config_name: &str) -> String {
    format!("{APPLIED_NAME_PREFIX}{config_name}")
}

/// Loads the previously applied spec. None on the first run or when the
/// record carries no payload.
pub async fn get_applied(
    client: &dyn ObjectClient,
    namespace: &str,
    config_name: &str,
) -> Result<Option<NetworkAddonsConfigSpec>, ControllerError> {
    let name = applied_name(config_name);
    let config_map = match client.get(&config_map_gvk(), Some(namespace), &name).await {
        Ok(config_map) => config_map,
        Err(err) if err.is_not_found() => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let Some(raw) = config_map
        .data
        .get("data")
        .and_then(|data| data.get(APPLIED_KEY))
        .and_then(|value| value.as_str())
    else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_str(raw)?))
}

/// Renders the ConfigMap holding `spec`. It goes first in the rendered
/// object set so the record never lags the operands it describes.
pub fn render_applied(
    spec: &NetworkAddonsConfigSpec,
    namespace: &str,
    config_name: &str,
) -> Result<DynamicObject, ControllerError> {
    let config_map = json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": applied_name(config_name),
            "namespace": namespace,
            "labels": {
                "app.kubernetes.io/part-of": "network-addons-operator",
            },
        },
        "data": {
            "applied": serde_json::to_string(spec)?,
        },
    });
    Ok(serde_json::from_value(config_map)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube_apply::MockObjectClient;

    use crds::{MacPoolSpec, NetworkAddonsConfigSpec};

    #[tokio::test]
    async fn absent_record_reads_as_none() {
        let client = MockObjectClient::new();
        let loaded = get_applied(&client, "network-addons", "cluster")
            .await
            .unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn record_round_trips_through_the_store() {
        let spec = NetworkAddonsConfigSpec {
            mac_pool: Some(MacPoolSpec {
                range_start: Some("02:00:00:00:00:00".to_owned()),
                range_end: Some("02:FF:FF:FF:FF:FF".to_owned()),
            }),
            ..Default::default()
        };

        let client = MockObjectClient::new();
        client.add_object(render_applied(&spec, "network-addons", "cluster").unwrap());

        let loaded = get_applied(&client, "network-addons", "cluster")
            .await
            .unwrap();
        assert_eq!(loaded, Some(spec));
    }

    #[tokio::test]
    async fn record_without_payload_reads_as_none() {
        let empty: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": applied_name("cluster"), "namespace": "network-addons" },
        }))
        .unwrap();

        let client = MockObjectClient::new();
        client.add_object(empty);

        let loaded = get_applied(&client, "network-addons", "cluster")
            .await
            .unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn malformed_payload_is_an_error() {
        let broken: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": applied_name("cluster"), "namespace": "network-addons" },
            "data": { "applied": "{not json" },
        }))
        .unwrap();

        let client = MockObjectClient::new();
        client.add_object(broken);

        let result = get_applied(&client, "network-addons", "cluster").await;
        assert!(result.is_err());
    }

    #[test]
    fn record_name_is_derived_from_the_config_name() {
        assert_eq!(applied_name("cluster"), "network-addons-applied-cluster");
    }
}
