//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the cluster
//! client, status manager, reconciler, watchers and the metrics server
//! together, then runs them until one of them exits.

use crate::error::ControllerError;
use crate::facts::ClusterFacts;
use crate::metrics::OperatorMetrics;
use crate::reconciler::render::{Images, RenderData};
use crate::reconciler::Reconciler;
use crate::server;
use crate::status::StatusManager;
use crate::watcher::Watcher;
use crds::{NetworkAddonsConfig, CLUSTER_CONFIG_NAME};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use kube::{Api, Client};
use kube_apply::{KubeObjectClient, ObjectClient};
use prometheus::Registry;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for the network add-ons operator.
pub struct Controller {
    config_watcher: JoinHandle<Result<(), ControllerError>>,
    deployment_watcher: JoinHandle<Result<(), ControllerError>>,
    daemon_set_watcher: JoinHandle<Result<(), ControllerError>>,
    metrics_server: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(
        namespace: String,
        metrics_addr: String,
        operator_version: String,
    ) -> Result<Self, ControllerError> {
        info!("Initializing network add-ons controller");

        // Create Kubernetes client
        let kube_client = Client::try_default().await?;

        let facts = ClusterFacts::from_env();
        info!("Cluster facts: {:?}", facts);

        let registry = Registry::new();
        let metrics = OperatorMetrics::register(&registry)
            .map_err(|e| ControllerError::InvalidConfig(format!("metrics registration: {}", e)))?;

        let object_client: Arc<dyn ObjectClient> =
            Arc::new(KubeObjectClient::new(kube_client.clone()));
        let status = Arc::new(StatusManager::new(
            object_client.clone(),
            CLUSTER_CONFIG_NAME,
            operator_version,
            metrics.ready.clone(),
        ));

        let render_data = RenderData {
            namespace: namespace.clone(),
            images: Images::from_env(),
            facts,
        };
        let reconciler = Arc::new(Reconciler::new(object_client, status, render_data));

        // Create API clients: the config is cluster-scoped, the operand
        // workloads live in the operand namespace
        let config_api: Api<NetworkAddonsConfig> = Api::all(kube_client.clone());
        let deployment_api: Api<Deployment> = Api::namespaced(kube_client.clone(), &namespace);
        let daemon_set_api: Api<DaemonSet> = Api::namespaced(kube_client, &namespace);

        let watcher_instance = Arc::new(Watcher::new(
            reconciler,
            config_api,
            deployment_api,
            daemon_set_api,
        ));

        // Start all watchers in background tasks
        let config_watcher = {
            let watcher = watcher_instance.clone();
            tokio::spawn(async move {
                watcher.watch_configs().await
            })
        };

        let deployment_watcher = {
            let watcher = watcher_instance.clone();
            tokio::spawn(async move {
                watcher.watch_deployments().await
            })
        };

        let daemon_set_watcher = {
            let watcher = watcher_instance;
            tokio::spawn(async move {
                watcher.watch_daemon_sets().await
            })
        };

        let metrics_server = tokio::spawn(async move {
            server::serve(metrics_addr, registry).await
        });

        Ok(Self {
            config_watcher,
            deployment_watcher,
            daemon_set_watcher,
            metrics_server,
        })
    }

    /// Runs the controller until shutdown.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("Network add-ons controller running");

        // Wait for any task to exit (they should run forever)
        tokio::select! {
            result = &mut self.config_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("NetworkAddonsConfig watcher panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("NetworkAddonsConfig watcher error: {}", e)))?;
            }
            result = &mut self.deployment_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("Deployment watcher panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("Deployment watcher error: {}", e)))?;
            }
            result = &mut self.daemon_set_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("DaemonSet watcher panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("DaemonSet watcher error: {}", e)))?;
            }
            result = &mut self.metrics_server => {
                result.map_err(|e| ControllerError::Watch(format!("Metrics server panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("Metrics server error: {}", e)))?;
            }
        }

        Ok(())
    }
}
