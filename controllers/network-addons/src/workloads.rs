//! Operand workload health.
//!
//! The reconcile path records which Deployments and DaemonSets it
//! deployed; this module inspects their live state and folds the result
//! into the level-1 failure slot of the status manager.

use kube::api::DynamicObject;
use kube::core::GroupVersionKind;
use kube_apply::ObjectClient;
use serde_json::Value;
use tracing::debug;

use crate::error::ControllerError;
use crate::status::{FailLevel, StatusManager};

fn deployment_gvk() -> GroupVersionKind {
    GroupVersionKind::gvk("apps", "v1", "Deployment")
}

fn daemon_set_gvk() -> GroupVersionKind {
    GroupVersionKind::gvk("apps", "v1", "DaemonSet")
}

/// Checks every tracked workload. All healthy means the available level
/// is reached; anything else is recorded as a level-1 failure with one
/// line per problem.
pub async fn check_workloads(
    client: &dyn ObjectClient,
    namespace: &str,
    status: &StatusManager,
) -> Result<(), ControllerError> {
    let attributes = status.attributes();
    let mut problems = Vec::new();

    for name in &attributes.deployments {
        match client.get(&deployment_gvk(), Some(namespace), name).await {
            Ok(obj) => {
                if let Some(problem) = deployment_problem(&obj) {
                    problems.push(problem);
                }
            }
            Err(err) if err.is_not_found() => {
                problems.push(format!("Deployment {namespace}/{name} does not exist"));
            }
            Err(err) => return Err(err.into()),
        }
    }

    for name in &attributes.daemon_sets {
        match client.get(&daemon_set_gvk(), Some(namespace), name).await {
            Ok(obj) => {
                if let Some(problem) = daemon_set_problem(&obj) {
                    problems.push(problem);
                }
            }
            Err(err) if err.is_not_found() => {
                problems.push(format!("DaemonSet {namespace}/{name} does not exist"));
            }
            Err(err) => return Err(err.into()),
        }
    }

    if problems.is_empty() {
        debug!("All tracked operand workloads are healthy");
        status.mark_not_failing(FailLevel::PodDeployment);
        status.set(true, Vec::new()).await;
    } else {
        status
            .set_failing(
                FailLevel::PodDeployment,
                "FailedWorkloads",
                &problems.join("\n"),
            )
            .await;
    }
    Ok(())
}

/// Describes what is wrong with a Deployment, or None when it is fully
/// rolled out and available.
fn deployment_problem(obj: &DynamicObject) -> Option<String> {
    let name = obj.metadata.name.as_deref().unwrap_or("<unnamed>");
    let Some(status) = obj.data.get("status") else {
        return Some(format!("Deployment {name} has not reported status yet"));
    };

    let generation = obj.metadata.generation.unwrap_or(0);
    let observed = status
        .get("observedGeneration")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    if observed < generation {
        return Some(format!("Deployment {name} rollout has not been observed yet"));
    }

    let unavailable = status
        .get("unavailableReplicas")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    if unavailable > 0 {
        return Some(format!(
            "Deployment {name} has {unavailable} unavailable replicas"
        ));
    }

    let available = status
        .get("availableReplicas")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    if available == 0 {
        return Some(format!("Deployment {name} has no available replicas"));
    }
    None
}

/// Describes what is wrong with a DaemonSet, or None when every
/// scheduled pod is available.
fn daemon_set_problem(obj: &DynamicObject) -> Option<String> {
    let name = obj.metadata.name.as_deref().unwrap_or("<unnamed>");
    let Some(status) = obj.data.get("status") else {
        return Some(format!("DaemonSet {name} has not reported status yet"));
    };

    let unavailable = status
        .get("numberUnavailable")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    if unavailable > 0 {
        return Some(format!("DaemonSet {name} has {unavailable} unavailable pods"));
    }

    let desired = status
        .get("desiredNumberScheduled")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let available = status
        .get("numberAvailable")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    if desired > available {
        return Some(format!(
            "DaemonSet {name} has {available}/{desired} pods available"
        ));
    }
    None
}
