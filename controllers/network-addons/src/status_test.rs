//! Status manager behavior over the mock cluster.

use std::sync::Arc;

use kube::api::DynamicObject;
use kube_apply::MockObjectClient;
use prometheus::IntGauge;
use serde_json::json;

use crds::{
    find_condition, ConditionStatus, ConditionType, NetworkAddonsConfigStatus, StatusCondition,
    CLUSTER_CONFIG_NAME,
};

use crate::status::{FailLevel, StatusManager};

fn seeded_config() -> DynamicObject {
    serde_json::from_value(json!({
        "apiVersion": "networkaddons.microscaler.io/v1alpha1",
        "kind": "NetworkAddonsConfig",
        "metadata": { "name": "cluster", "uid": "uid-config" },
        "spec": {},
    }))
    .unwrap()
}

fn manager(client: &MockObjectClient, ready: &IntGauge) -> StatusManager {
    StatusManager::new(
        Arc::new(client.clone()),
        CLUSTER_CONFIG_NAME,
        "0.99.0",
        ready.clone(),
    )
}

fn gauge() -> IntGauge {
    IntGauge::new("test_ready", "test gauge").unwrap()
}

fn status_of(client: &MockObjectClient) -> NetworkAddonsConfigStatus {
    let obj = client
        .stored("NetworkAddonsConfig", None, "cluster")
        .expect("config stored");
    serde_json::from_value(obj.data["status"].clone()).expect("status deserializes")
}

fn condition(
    status: &NetworkAddonsConfigStatus,
    condition_type: ConditionType,
) -> StatusCondition {
    find_condition(&status.conditions, condition_type)
        .cloned()
        .expect("condition present")
}

#[tokio::test]
async fn config_failures_outrank_workload_failures() {
    let client = MockObjectClient::new();
    client.add_object(seeded_config());
    let ready = gauge();
    let manager = manager(&client, &ready);

    manager
        .set_failing(
            FailLevel::PodDeployment,
            "FailedWorkloads",
            "DaemonSet kube-multus-ds has 1 unavailable pods",
        )
        .await;
    manager
        .set_failing(
            FailLevel::OperatorConfig,
            "FailedValidation",
            "macPool rangeStart is invalid",
        )
        .await;

    let status = status_of(&client);
    let degraded = condition(&status, ConditionType::Degraded);
    assert_eq!(degraded.status, ConditionStatus::True);
    assert_eq!(degraded.reason.as_deref(), Some("FailedValidation"));
    assert_eq!(
        condition(&status, ConditionType::Available).status,
        ConditionStatus::False
    );
    assert_eq!(ready.get(), 0);
}

#[tokio::test]
async fn progressing_blocks_available_until_rollout_completes() {
    let client = MockObjectClient::new();
    client.add_object(seeded_config());
    let ready = gauge();
    let manager = manager(&client, &ready);

    manager
        .set(
            false,
            vec![StatusCondition::new(
                ConditionType::Progressing,
                ConditionStatus::True,
                "Deploying",
                "Applying desired configuration",
            )],
        )
        .await;

    let status = status_of(&client);
    assert_eq!(
        condition(&status, ConditionType::Progressing).status,
        ConditionStatus::True
    );
    let available = condition(&status, ConditionType::Available);
    assert_eq!(available.status, ConditionStatus::False);
    assert_eq!(available.reason.as_deref(), Some("Deploying"));
    assert!(status.observed_version.is_none());
    assert_eq!(ready.get(), 0);

    manager.set(true, Vec::new()).await;

    let status = status_of(&client);
    assert_eq!(
        condition(&status, ConditionType::Available).status,
        ConditionStatus::True
    );
    assert_eq!(
        condition(&status, ConditionType::Progressing).status,
        ConditionStatus::False
    );
    assert_eq!(status.observed_version.as_deref(), Some("0.99.0"));
    assert_eq!(status.operator_version.as_deref(), Some("0.99.0"));
    assert_eq!(ready.get(), 1);
}

#[tokio::test]
async fn cleared_workload_failure_restores_available() {
    let client = MockObjectClient::new();
    client.add_object(seeded_config());
    let ready = gauge();
    let manager = manager(&client, &ready);

    manager
        .set_failing(
            FailLevel::PodDeployment,
            "FailedWorkloads",
            "Deployment mac-controller-manager has no available replicas",
        )
        .await;
    let status = status_of(&client);
    assert_eq!(
        condition(&status, ConditionType::Available).status,
        ConditionStatus::False
    );

    manager.mark_not_failing(FailLevel::PodDeployment);
    manager.set(true, Vec::new()).await;

    let status = status_of(&client);
    assert_eq!(
        condition(&status, ConditionType::Available).status,
        ConditionStatus::True
    );
    assert_eq!(
        condition(&status, ConditionType::Degraded).status,
        ConditionStatus::False
    );
    assert_eq!(ready.get(), 1);
}

#[tokio::test]
async fn status_write_retries_conflicts() {
    let client = MockObjectClient::new();
    client.add_object(seeded_config());
    client.fail_status_replaces(2);
    let ready = gauge();
    let manager = manager(&client, &ready);

    manager.set(true, Vec::new()).await;

    assert_eq!(client.status_replace_count(), 3);
    let status = status_of(&client);
    assert_eq!(
        condition(&status, ConditionType::Available).status,
        ConditionStatus::True
    );
}

#[tokio::test]
async fn status_write_gives_up_after_bounded_attempts() {
    let client = MockObjectClient::new();
    client.add_object(seeded_config());
    client.fail_status_replaces(5);
    let ready = gauge();
    let manager = manager(&client, &ready);

    manager.set(true, Vec::new()).await;

    assert_eq!(client.status_replace_count(), 3);
    let stored = client
        .stored("NetworkAddonsConfig", None, "cluster")
        .unwrap();
    assert!(stored.data.get("status").is_none());
}

#[tokio::test]
async fn tracked_generation_lands_in_the_status() {
    let client = MockObjectClient::new();
    client.add_object(seeded_config());
    let ready = gauge();
    let manager = manager(&client, &ready);

    manager.set_generation(Some(7));
    manager.set(true, Vec::new()).await;

    assert_eq!(status_of(&client).observed_generation, Some(7));
}
