//! Status conditions for the NetworkAddonsConfig resource.
//!
//! The controller reports three condition types. `Progressing` while an
//! apply or rollout is in flight, `Available` once every operand is ready,
//! `Degraded` when configuration or deployment failed.

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionType {
    Available,
    Progressing,
    Degraded,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusCondition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,

    pub status: ConditionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// RFC 3339 timestamp of the last status flip. Updating reason or
    /// message alone does not move it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

impl StatusCondition {
    pub fn new(
        condition_type: ConditionType,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            condition_type,
            status,
            reason: Some(reason.into()),
            message: Some(message.into()),
            last_transition_time: Some(Utc::now().to_rfc3339()),
        }
    }
}

/// Upsert `cond` into `conditions`, keyed by condition type. The previous
/// transition time is kept when the status value did not change.
pub fn set_condition(conditions: &mut Vec<StatusCondition>, mut cond: StatusCondition) {
    match conditions
        .iter_mut()
        .find(|c| c.condition_type == cond.condition_type)
    {
        Some(existing) => {
            if existing.status == cond.status {
                cond.last_transition_time = existing.last_transition_time.clone();
            }
            *existing = cond;
        }
        None => conditions.push(cond),
    }
}

pub fn find_condition(
    conditions: &[StatusCondition],
    condition_type: ConditionType,
) -> Option<&StatusCondition> {
    conditions.iter().find(|c| c.condition_type == condition_type)
}
