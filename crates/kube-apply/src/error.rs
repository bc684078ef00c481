//! Apply engine errors

use thiserror::Error;

use crate::paths::PathError;

/// Errors that can occur while converging objects against the cluster API
#[derive(Debug, Error)]
pub enum ApplyError {
    /// The target object does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Optimistic-concurrency conflict (stale resource version)
    #[error("conflict: {0}")]
    Conflict(String),

    /// The API server rejected the object as invalid (includes
    /// immutable-field violations)
    #[error("invalid object: {0}")]
    Invalid(String),

    /// The object's kind is not served by the cluster
    #[error("kind not registered with the cluster: {0}")]
    KindUnknown(String),

    /// The object is missing type metadata (apiVersion/kind)
    #[error("object has no type metadata: {0}")]
    MissingTypeMeta(String),

    /// The object has no metadata.name
    #[error("object has no name")]
    MissingName,

    /// The kind is namespaced but the object carries no namespace
    #[error("namespace required for namespaced kind {0}")]
    MissingNamespace(String),

    /// A shape this engine refuses to merge
    #[error("unsupported object: {0}")]
    Unsupported(String),

    /// The object's apiVersion does not parse as group/version
    #[error(transparent)]
    GroupVersion(#[from] kube::core::gvk::ParseGroupVersionError),

    /// Field-tree access failed
    #[error(transparent)]
    Path(#[from] PathError),

    /// JSON serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other Kubernetes API error
    #[error(transparent)]
    Kube(#[from] kube::Error),
}

impl ApplyError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApplyError::NotFound(_))
    }

    pub fn is_kind_unknown(&self) -> bool {
        matches!(self, ApplyError::KindUnknown(_))
    }
}

/// Classify a raw kube error by HTTP status so callers can match on the
/// cases they recover from. `what` names the object for the message.
pub(crate) fn classify(err: kube::Error, what: &str) -> ApplyError {
    match &err {
        kube::Error::Api(resp) => match resp.code {
            404 => ApplyError::NotFound(what.to_owned()),
            409 => ApplyError::Conflict(resp.message.clone()),
            422 => ApplyError::Invalid(resp.message.clone()),
            _ => ApplyError::Kube(err),
        },
        _ => ApplyError::Kube(err),
    }
}
