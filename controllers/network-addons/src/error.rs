//! Controller-specific error types.
//!
//! This module defines error types specific to the network add-ons
//! controller that are not covered by upstream library errors.

use kube::Error as KubeError;
use kube_apply::ApplyError;
use thiserror::Error;

/// Errors that can occur in the network add-ons controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Object apply/delete error
    #[error("Apply error: {0}")]
    Apply(#[from] ApplyError),

    /// The requested configuration is not acceptable
    #[error("Configuration validation failed:\n{0}")]
    Validation(String),

    /// The requested change would disrupt running operands
    #[error("Configuration change rejected:\n{0}")]
    UnsafeChange(String),

    /// Invalid controller configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON encoding or decoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error from the metrics listener
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
