//! Leveled status reporting for the NetworkAddonsConfig resource.
//!
//! Failures are recorded in priority slots: level 0 for configuration
//! errors (validation, defaulting, safety, render), level 1 for unhealthy
//! operand workloads. Only the lowest set slot is surfaced, so a stale
//! workload failure never hides a fresh configuration error.
//!
//! Status writes are best-effort. Conflicts with other writers are
//! retried a fixed number of times and then dropped with a log line.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use kube_apply::{ApplyError, ObjectClient};
use prometheus::IntGauge;
use tracing::warn;

use crds::{
    find_condition, set_condition, ConditionStatus, ConditionType, DeployedContainer,
    NetworkAddonsConfigStatus, StatusCondition,
};

use crate::reconciler::config_gvk;
use crate::retry::retry_fixed;

const STATUS_WRITE_ATTEMPTS: u32 = 3;
const STATUS_WRITE_DELAY: Duration = Duration::from_secs(1);

/// Failure priority tiers, lowest value surfaced first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailLevel {
    /// The configuration itself cannot be applied.
    OperatorConfig = 0,
    /// The configuration applied but an operand workload is unhealthy.
    PodDeployment = 1,
}

#[derive(Debug, Clone)]
struct Failure {
    reason: String,
    message: String,
}

/// Workload inventory written by the reconcile path and read by the
/// workload watch path.
#[derive(Debug, Clone, Default)]
pub struct TrackedAttributes {
    pub deployments: Vec<String>,
    pub daemon_sets: Vec<String>,
    pub containers: Vec<DeployedContainer>,
    pub generation: Option<i64>,
}

#[derive(Debug, Default)]
struct Inner {
    failing: [Option<Failure>; 2],
    attributes: TrackedAttributes,
}

/// Serializes condition updates onto the config's status subresource.
pub struct StatusManager {
    client: Arc<dyn ObjectClient>,
    name: String,
    operator_version: String,
    inner: Mutex<Inner>,
    ready: IntGauge,
}

impl StatusManager {
    pub fn new(
        client: Arc<dyn ObjectClient>,
        name: impl Into<String>,
        operator_version: impl Into<String>,
        ready: IntGauge,
    ) -> Self {
        Self {
            client,
            name: name.into(),
            operator_version: operator_version.into(),
            inner: Mutex::new(Inner::default()),
            ready,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the tracked workload inventory.
    pub fn set_attributes(&self, attributes: TrackedAttributes) {
        self.lock().attributes = attributes;
    }

    /// Snapshot of the tracked workload inventory.
    pub fn attributes(&self) -> TrackedAttributes {
        self.lock().attributes.clone()
    }

    /// Updates only the tracked generation, leaving the inventory alone.
    pub fn set_generation(&self, generation: Option<i64>) {
        self.lock().attributes.generation = generation;
    }

    /// Records a failure at `level` and persists the resulting conditions.
    pub async fn set_failing(&self, level: FailLevel, reason: &str, message: &str) {
        {
            let mut inner = self.lock();
            inner.failing[level as usize] = Some(Failure {
                reason: reason.to_owned(),
                message: message.to_owned(),
            });
        }
        self.set(false, Vec::new()).await;
    }

    /// Clears the failure slot at `level`. The next `set` call persists
    /// the cleared state.
    pub fn mark_not_failing(&self, level: FailLevel) {
        self.lock().failing[level as usize] = None;
    }

    /// Recomputes the conditions and writes them to the status
    /// subresource. `reached_available` marks a fully applied
    /// configuration whose operands all report healthy; `extra` carries
    /// caller-provided conditions applied before the leveled rules
    /// (Progressing=True at apply start, chiefly).
    pub async fn set(&self, reached_available: bool, extra: Vec<StatusCondition>) {
        let result = retry_fixed(STATUS_WRITE_ATTEMPTS, STATUS_WRITE_DELAY, || {
            self.write_once(reached_available, &extra)
        })
        .await;
        if let Err(err) = result {
            warn!(error = %err, "Giving up on status update");
        }
    }

    async fn write_once(
        &self,
        reached_available: bool,
        extra: &[StatusCondition],
    ) -> Result<(), ApplyError> {
        let mut live = self.client.get(&config_gvk(), None, &self.name).await?;
        let mut status: NetworkAddonsConfigStatus = match live.data.get("status") {
            Some(value) => serde_json::from_value(value.clone())?,
            None => NetworkAddonsConfigStatus::default(),
        };

        let available = self.compute(&mut status, reached_available, extra);
        live.data["status"] = serde_json::to_value(&status)?;
        self.client.replace_status(&live).await?;
        self.ready.set(i64::from(available));
        Ok(())
    }

    /// Applies the leveled transition rules to `status`. Returns whether
    /// Available ended up True.
    fn compute(
        &self,
        status: &mut NetworkAddonsConfigStatus,
        reached_available: bool,
        extra: &[StatusCondition],
    ) -> bool {
        let inner = self.lock();
        let conditions = &mut status.conditions;

        for cond in extra {
            set_condition(conditions, cond.clone());
        }
        let caller_degraded = extra
            .iter()
            .any(|c| c.condition_type == ConditionType::Degraded);

        // The lowest set slot owns the Degraded condition.
        let first_failure = inner.failing.iter().flatten().next().cloned();
        match &first_failure {
            Some(failure) => set_condition(
                conditions,
                StatusCondition::new(
                    ConditionType::Degraded,
                    ConditionStatus::True,
                    &failure.reason,
                    &failure.message,
                ),
            ),
            None if !caller_degraded => set_condition(
                conditions,
                StatusCondition::new(ConditionType::Degraded, ConditionStatus::False, "", ""),
            ),
            None => {}
        }

        let config_failing = inner.failing[FailLevel::OperatorConfig as usize].is_some();
        let workload_failing = inner.failing[FailLevel::PodDeployment as usize].is_some();
        let available_already_false = matches!(
            find_condition(conditions, ConditionType::Available),
            Some(c) if c.status == ConditionStatus::False
        );
        let caller_progressing = extra.iter().any(|c| {
            c.condition_type == ConditionType::Progressing && c.status == ConditionStatus::True
        });

        if config_failing {
            if let Some(failure) = &first_failure {
                if !available_already_false {
                    set_condition(
                        conditions,
                        StatusCondition::new(
                            ConditionType::Available,
                            ConditionStatus::False,
                            &failure.reason,
                            &failure.message,
                        ),
                    );
                    set_condition(
                        conditions,
                        StatusCondition::new(
                            ConditionType::Progressing,
                            ConditionStatus::False,
                            &failure.reason,
                            &failure.message,
                        ),
                    );
                }
            }
        } else if workload_failing {
            if let Some(failure) = &first_failure {
                if !available_already_false {
                    set_condition(
                        conditions,
                        StatusCondition::new(
                            ConditionType::Available,
                            ConditionStatus::False,
                            &failure.reason,
                            &failure.message,
                        ),
                    );
                }
            }
        } else if caller_progressing {
            set_condition(
                conditions,
                StatusCondition::new(
                    ConditionType::Available,
                    ConditionStatus::False,
                    "Deploying",
                    "Operand rollout in progress",
                ),
            );
        } else if reached_available {
            set_condition(
                conditions,
                StatusCondition::new(
                    ConditionType::Available,
                    ConditionStatus::True,
                    "Operational",
                    "All operands are deployed and healthy",
                ),
            );
            set_condition(
                conditions,
                StatusCondition::new(
                    ConditionType::Progressing,
                    ConditionStatus::False,
                    "Operational",
                    "All operands are deployed and healthy",
                ),
            );
            status.observed_version = Some(self.operator_version.clone());
            status.containers = inner.attributes.containers.clone();
        }

        status.operator_version = Some(self.operator_version.clone());
        status.target_version = Some(self.operator_version.clone());
        status.observed_generation = inner.attributes.generation;

        matches!(
            find_condition(&status.conditions, ConditionType::Available),
            Some(c) if c.status == ConditionStatus::True
        )
    }
}
