//! Reconcile orchestration for the NetworkAddonsConfig resource.
//!
//! One pass: canonicalize the desired spec, validate it, load the
//! previously applied spec, fill defaults, guard write-once settings,
//! render, apply, delete removed components, then derive workload
//! health. Every step reports through the status manager.

pub mod applied;
pub mod defaults;
pub mod render;
pub mod safety;
pub mod validate;

#[cfg(test)]
mod validate_test;

use std::sync::Arc;

use kube::api::DynamicObject;
use kube::core::GroupVersionKind;
use kube_apply::{
    apply_object, delete_owned, display_name, has_annotation, owner_reference, set_owner,
    ObjectClient,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crds::{
    ConditionStatus, ConditionType, DeployedContainer, NetworkAddonsConfig, StatusCondition,
    CLUSTER_CONFIG_NAME, IGNORE_ERRORS_ANNOTATION,
};

use crate::error::ControllerError;
use crate::status::{FailLevel, StatusManager, TrackedAttributes};
use crate::workloads;

use render::RenderData;

pub(crate) fn config_gvk() -> GroupVersionKind {
    GroupVersionKind::gvk(crds::GROUP, "v1alpha1", "NetworkAddonsConfig")
}

/// Drives NetworkAddonsConfig resources to their rendered operand
/// objects.
pub struct Reconciler {
    client: Arc<dyn ObjectClient>,
    status: Arc<StatusManager>,
    render_data: RenderData,
}

impl Reconciler {
    pub fn new(
        client: Arc<dyn ObjectClient>,
        status: Arc<StatusManager>,
        render_data: RenderData,
    ) -> Self {
        Self {
            client,
            status,
            render_data,
        }
    }

    /// One full reconcile pass for `config`.
    pub async fn reconcile_config(
        &self,
        config: &NetworkAddonsConfig,
    ) -> Result<(), ControllerError> {
        let name = config.metadata.name.as_deref().unwrap_or_default();
        if name != CLUSTER_CONFIG_NAME {
            warn!(
                "Ignoring NetworkAddonsConfig {}: only {} is reconciled",
                name, CLUSTER_CONFIG_NAME
            );
            return Ok(());
        }
        info!("Reconciling NetworkAddonsConfig {}", name);
        self.status.set_generation(config.metadata.generation);

        let mut spec = config.spec.clone();
        validate::canonicalize(&mut spec);

        let errors = validate::validate(&spec, &self.render_data.facts);
        if !errors.is_empty() {
            return self
                .fail_config("FailedValidation", &errors, ControllerError::Validation)
                .await;
        }

        let previous =
            applied::get_applied(self.client.as_ref(), &self.render_data.namespace, name).await?;

        let errors = defaults::fill_defaults(&mut spec, previous.as_ref());
        if !errors.is_empty() {
            return self
                .fail_config("FailedDefaults", &errors, ControllerError::Validation)
                .await;
        }

        if let Some(previous) = &previous {
            let errors = safety::is_change_safe(previous, &spec);
            if !errors.is_empty() {
                return self
                    .fail_config("UnsafeChange", &errors, ControllerError::UnsafeChange)
                    .await;
            }
        }

        // Input accepted; any stale configuration failure is gone.
        self.status.mark_not_failing(FailLevel::OperatorConfig);
        self.status
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

        let objects = render::render_all(&spec, &self.render_data, name)?;
        let owner = owner_reference(config).ok_or_else(|| {
            ControllerError::InvalidConfig(
                "NetworkAddonsConfig has no uid; cannot own operands".to_owned(),
            )
        })?;

        for object in &objects {
            let mut object = object.clone();
            set_owner(&mut object, &owner);
            match apply_object(self.client.as_ref(), &object).await {
                Ok(outcome) => {
                    debug!("Applied {}: {:?}", display_name(&object), outcome);
                }
                Err(err) if has_annotation(&object, IGNORE_ERRORS_ANNOTATION, "true") => {
                    warn!(
                        "Ignoring apply failure for {}: {}",
                        display_name(&object),
                        err
                    );
                }
                Err(err) => {
                    self.status
                        .set_failing(
                            FailLevel::PodDeployment,
                            "FailedApply",
                            &format!("Failed to apply {}: {}", display_name(&object), err),
                        )
                        .await;
                    return Err(err.into());
                }
            }
        }

        if let Some(previous) = &previous {
            for object in render::objects_to_remove(previous, &spec, &self.render_data)? {
                info!("Removing {}", display_name(&object));
                if let Err(err) = delete_owned(self.client.as_ref(), &object, &owner).await {
                    self.status
                        .set_failing(
                            FailLevel::PodDeployment,
                            "FailedCleanup",
                            &format!("Failed to delete {}: {}", display_name(&object), err),
                        )
                        .await;
                    return Err(err.into());
                }
            }
        }

        self.status.set_attributes(tracked_attributes(
            &objects,
            config.metadata.generation,
            &self.render_data.namespace,
        ));
        workloads::check_workloads(
            self.client.as_ref(),
            &self.render_data.namespace,
            &self.status,
        )
        .await
    }

    /// Re-derives operand health. Used by the workload watch paths; a
    /// no-op until a reconcile pass has tracked something.
    pub async fn check_workload_health(&self) -> Result<(), ControllerError> {
        if self.status.attributes().generation.is_none() {
            return Ok(());
        }
        workloads::check_workloads(
            self.client.as_ref(),
            &self.render_data.namespace,
            &self.status,
        )
        .await
    }

    async fn fail_config(
        &self,
        reason: &str,
        errors: &[String],
        wrap: fn(String) -> ControllerError,
    ) -> Result<(), ControllerError> {
        let message = errors.join("\n");
        self.status
            .set_failing(FailLevel::OperatorConfig, reason, &message)
            .await;
        Err(wrap(message))
    }
}

/// Collects the workload names and container inventory from the
/// rendered object set.
fn tracked_attributes(
    objects: &[DynamicObject],
    generation: Option<i64>,
    namespace: &str,
) -> TrackedAttributes {
    let mut attributes = TrackedAttributes {
        generation,
        ..Default::default()
    };
    for object in objects {
        let kind = object
            .types
            .as_ref()
            .map(|types| types.kind.as_str())
            .unwrap_or_default();
        let Some(name) = object.metadata.name.clone() else {
            continue;
        };
        match kind {
            "Deployment" => attributes.deployments.push(name.clone()),
            "DaemonSet" => attributes.daemon_sets.push(name.clone()),
            _ => continue,
        }
        for (container_name, image) in containers_of(object) {
            attributes.containers.push(DeployedContainer {
                namespace: namespace.to_owned(),
                parent_kind: kind.to_owned(),
                parent_name: name.clone(),
                name: container_name,
                image,
            });
        }
    }
    attributes
}

fn containers_of(object: &DynamicObject) -> Vec<(String, String)> {
    object
        .data
        .pointer("/spec/template/spec/containers")
        .and_then(Value::as_array)
        .map(|containers| {
            containers
                .iter()
                .filter_map(|container| {
                    Some((
                        container.get("name")?.as_str()?.to_owned(),
                        container.get("image")?.as_str()?.to_owned(),
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}
