//! Kubernetes resource watchers.
//!
//! This module handles watching the NetworkAddonsConfig resource and the
//! operand workloads for changes, triggering reconciliation using
//! kube_runtime::Controller.
//!
//! All watchers use a generic `watch_resource()` helper that properly handles
//! the reconcile loop with automatic reconnection and retry logic.

use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crds::NetworkAddonsConfig;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use kube::{Api, ResourceExt};
use kube_runtime::{Controller, watcher, controller::{Action, Config as ControllerConfig}};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Generic watcher helper that uses kube_runtime::Controller properly.
///
/// - Controller handles automatic reconnection
/// - Retries and backoff are managed automatically
/// - Watching continues indefinitely (no one-shot behavior)
///
/// The reconcile_fn wraps one of the Reconciler entry points and decides
/// the follow-up Action.
async fn watch_resource<K, F>(
    api: Api<K>,
    reconciler: Arc<Reconciler>,
    reconcile_fn: F,
    resource_name: &str,
) -> Result<(), ControllerError>
where
    K: kube::Resource + Clone + Send + Sync + 'static + std::fmt::Debug + serde::de::DeserializeOwned,
    K::DynamicType: Default + std::cmp::Eq + std::hash::Hash + Clone + std::fmt::Debug + Unpin,
    F: Fn(Arc<Reconciler>, Arc<K>) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Action, ControllerError>> + Send>> + Send + Sync + Clone + 'static,
{
    info!("Starting {} watcher", resource_name);

    // Error policy: requeue with a fixed delay on errors
    let error_policy = |obj: Arc<K>, error: &ControllerError, _ctx: Arc<Reconciler>| {
        error!("Reconciliation error for {} {}: {}", resource_name, obj.name_any(), error);
        Action::requeue(Duration::from_secs(60))
    };

    // Reconcile function: wraps our existing reconcile functions.
    // Controller filters status-only updates by generation already; the
    // debug line helps diagnose excessive reconciliations.
    let reconcile = move |obj: Arc<K>, ctx: Arc<Reconciler>| {
        let reconcile_fn = reconcile_fn.clone();
        let resource_name = resource_name.to_string();
        async move {
            debug!("Reconciling {} {}", resource_name, obj.name_any());

            match reconcile_fn(ctx, obj).await {
                Ok(action) => Ok(action),
                Err(e) => {
                    error!("Reconciliation failed for {}: {}", resource_name, e);
                    Err(e)
                }
            }
        }
    };

    // Debounce waits 5 seconds after the last event before reconciling,
    // batching bursts of workload status updates together. Concurrency
    // limits to 3 concurrent reconciliations per watcher.
    let controller_config = ControllerConfig::default()
        .debounce(Duration::from_secs(5))
        .concurrency(3);

    Controller::new(api, watcher::Config::default())
        .with_config(controller_config)
        .run(reconcile, error_policy, reconciler)
        .for_each(|res| async move {
            if let Err(e) = res {
                error!("Controller error for {}: {}", resource_name, e);
            }
        })
        .await;

    Ok(())
}

/// Watches Kubernetes resources for changes.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    config_api: Api<NetworkAddonsConfig>,
    deployment_api: Api<Deployment>,
    daemon_set_api: Api<DaemonSet>,
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(
        reconciler: Arc<Reconciler>,
        config_api: Api<NetworkAddonsConfig>,
        deployment_api: Api<Deployment>,
        daemon_set_api: Api<DaemonSet>,
    ) -> Self {
        Self {
            reconciler,
            config_api,
            deployment_api,
            daemon_set_api,
        }
    }

    /// Starts watching NetworkAddonsConfig resources.
    pub async fn watch_configs(&self) -> Result<(), ControllerError> {
        watch_resource(
            self.config_api.clone(),
            self.reconciler.clone(),
            |reconciler, resource| {
                Box::pin(async move {
                    match reconciler.reconcile_config(&*resource).await {
                        Ok(()) => Ok(Action::await_change()),
                        Err(e) => Err(e),
                    }
                })
            },
            "NetworkAddonsConfig",
        ).await
    }

    /// Starts watching operand Deployments. Their state feeds the
    /// workload level of the status conditions.
    pub async fn watch_deployments(&self) -> Result<(), ControllerError> {
        watch_resource(
            self.deployment_api.clone(),
            self.reconciler.clone(),
            |reconciler, _resource| {
                Box::pin(async move {
                    reconciler.check_workload_health().await?;
                    Ok(Action::await_change())
                })
            },
            "Deployment",
        ).await
    }

    /// Starts watching operand DaemonSets. Their state feeds the
    /// workload level of the status conditions.
    pub async fn watch_daemon_sets(&self) -> Result<(), ControllerError> {
        watch_resource(
            self.daemon_set_api.clone(),
            self.reconciler.clone(),
            |reconciler, _resource| {
                Box::pin(async move {
                    reconciler.check_workload_health().await?;
                    Ok(Action::await_change())
                })
            },
            "DaemonSet",
        ).await
    }
}
