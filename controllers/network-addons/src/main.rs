//! Network Add-ons Operator
//!
//! Deploys and steers the optional cluster networking components from a
//! single cluster-scoped NetworkAddonsConfig resource:
//! - Multus: meta CNI plugin for secondary pod networks
//! - Linux bridge: bridge CNI plugin plus the node bridge marker
//! - MAC pool: cluster-wide MAC address manager for pod interfaces
//! - Dynamic networks: hot-plug controller for network attachments

mod controller;
mod error;
mod facts;
mod metrics;
mod reconciler;
mod retry;
mod server;
mod status;
mod watcher;
mod workloads;

#[cfg(test)]
mod status_test;

use crate::error::ControllerError;
use controller::Controller;
use std::env;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt::init();

    info!("Starting Network Add-ons Operator");

    // Load configuration from environment variables
    let namespace = env::var("OPERAND_NAMESPACE")
        .unwrap_or_else(|_| "network-addons".to_string());
    let metrics_addr = env::var("METRICS_BIND_ADDRESS")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let operator_version = env::var("OPERATOR_VERSION")
        .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

    info!("Configuration:");
    info!("  Operand namespace: {}", namespace);
    info!("  Metrics address: {}", metrics_addr);
    info!("  Operator version: {}", operator_version);

    // Initialize and run controller
    let controller = Controller::new(namespace, metrics_addr, operator_version).await?;
    controller.run().await?;

    Ok(())
}
