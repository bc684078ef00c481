//! Create/update/delete sequencing for rendered objects.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::DynamicObject;
use kube::core::GroupVersionKind;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::ObjectClient;
use crate::error::ApplyError;
use crate::merge::{merge_for_update, semantically_equal};
use crate::object::{display_name, gvk_of, name_of};
use crate::owner::is_owned_by;

/// What `apply_object` did to converge the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Created,
    Updated,
    Unchanged,
    /// Update hit an immutable field; the object was deleted and created
    /// fresh instead.
    Recreated,
    /// Existing TLS secret material is never replaced.
    SkippedTlsSecret,
}

const TLS_SECRET_TYPE: &str = "kubernetes.io/tls";

/// Converge one rendered object: create it when absent, otherwise merge
/// with the live object and update only when the merge produced a change.
pub async fn apply_object(
    client: &dyn ObjectClient,
    desired: &DynamicObject,
) -> Result<ApplyOutcome, ApplyError> {
    let gvk = gvk_of(desired)?;
    let name = name_of(desired)?;
    let namespace = desired.metadata.namespace.as_deref();

    reject_unsupported(desired, &gvk)?;

    let current = match client.get(&gvk, namespace, name).await {
        Ok(current) => current,
        Err(err) if err.is_not_found() => {
            client.create(desired).await?;
            debug!(object = %display_name(desired), "created");
            return Ok(ApplyOutcome::Created);
        }
        Err(err) => return Err(err),
    };

    if is_tls_secret(desired, &gvk) {
        debug!(object = %display_name(desired), "existing TLS secret left untouched");
        return Ok(ApplyOutcome::SkippedTlsSecret);
    }

    let merged = merge_for_update(&current, desired)?;
    if semantically_equal(&merged, &current)? {
        return Ok(ApplyOutcome::Unchanged);
    }

    match client.update(&merged).await {
        Ok(_) => {
            debug!(object = %display_name(desired), "updated");
            Ok(ApplyOutcome::Updated)
        }
        Err(ApplyError::Invalid(reason)) if recreate_on_immutable(&gvk) => {
            warn!(
                object = %display_name(desired),
                %reason,
                "update rejected on immutable field, recreating"
            );
            client.delete(&gvk, namespace, name).await?;
            client.create(desired).await?;
            Ok(ApplyOutcome::Recreated)
        }
        Err(err) => Err(err),
    }
}

/// Delete an object previously rendered by this operator. Gone already, or
/// a kind the cluster no longer serves, counts as success; objects not
/// owned by `owner` are left alone.
pub async fn delete_owned(
    client: &dyn ObjectClient,
    obj: &DynamicObject,
    owner: &OwnerReference,
) -> Result<(), ApplyError> {
    let gvk = gvk_of(obj)?;
    let name = name_of(obj)?;
    let namespace = obj.metadata.namespace.as_deref();

    let current = match client.get(&gvk, namespace, name).await {
        Ok(current) => current,
        Err(err) if err.is_not_found() || err.is_kind_unknown() => return Ok(()),
        Err(err) => return Err(err),
    };

    if !is_owned_by(&current, owner) {
        warn!(
            object = %display_name(obj),
            "refusing to delete object not owned by this operator"
        );
        return Ok(());
    }

    match client.delete(&gvk, namespace, name).await {
        Ok(()) => {
            info!(object = %display_name(obj), "deleted");
            Ok(())
        }
        Err(err) if err.is_not_found() => Ok(()),
        Err(err) => Err(err),
    }
}

/// Shapes the merge policies cannot handle are rejected before any call
/// goes out. A ServiceAccount with caller-listed secrets would fight the
/// token controller over the secret list.
fn reject_unsupported(desired: &DynamicObject, gvk: &GroupVersionKind) -> Result<(), ApplyError> {
    if gvk.group.is_empty() && gvk.kind == "ServiceAccount" {
        let has_secrets = desired
            .data
            .get("secrets")
            .and_then(Value::as_array)
            .is_some_and(|secrets| !secrets.is_empty());
        if has_secrets {
            return Err(ApplyError::Unsupported(format!(
                "{}: ServiceAccount secrets are managed by the cluster and cannot be applied",
                display_name(desired)
            )));
        }
    }
    Ok(())
}

fn is_tls_secret(desired: &DynamicObject, gvk: &GroupVersionKind) -> bool {
    gvk.group.is_empty()
        && gvk.kind == "Secret"
        && desired.data.get("type").and_then(Value::as_str) == Some(TLS_SECRET_TYPE)
}

/// Selector changes on workloads from old operator versions fail with 422;
/// those two kinds are safe to delete and recreate.
fn recreate_on_immutable(gvk: &GroupVersionKind) -> bool {
    gvk.group == "apps" && matches!(gvk.kind.as_str(), "DaemonSet" | "Deployment")
}
