//! # GSMSecret Status
//!
//! Status types and the `Ready` condition bookkeeping.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Condition type reported by the controller
pub const CONDITION_READY: &str = "Ready";

/// Ready reasons, one per reconcile phase
pub const REASON_SYNCED: &str = "Synced";
pub const REASON_FETCH_FAILED: &str = "FetchFailed";
pub const REASON_BUILD_FAILED: &str = "BuildFailed";
pub const REASON_APPLY_FAILED: &str = "ApplyFailed";

/// Status of the GSMSecret resource
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GsmSecretStatus {
    /// Most recent generation observed by the controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// Conditions represent the latest available observations
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub r#type: String,
    /// True, False or Unknown
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// RFC3339 time of the last status flip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// Condition status values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        }
    }
}

impl GsmSecretStatus {
    /// Current condition of the given type, if any
    #[must_use]
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == condition_type)
    }

    /// Upsert a condition.
    ///
    /// `reason`, `message` and `observedGeneration` are always overwritten.
    /// `lastTransitionTime` only moves when `status` changes (or on first insert).
    pub fn set_condition(
        &mut self,
        condition_type: &str,
        status: ConditionStatus,
        reason: &str,
        message: impl Into<String>,
        generation: Option<i64>,
        now: DateTime<Utc>,
    ) {
        let now = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        let message = message.into();

        if let Some(existing) = self
            .conditions
            .iter_mut()
            .find(|c| c.r#type == condition_type)
        {
            if existing.status != status.as_str() || existing.last_transition_time.is_none() {
                existing.last_transition_time = Some(now);
            }
            existing.status = status.as_str().to_string();
            existing.reason = Some(reason.to_string());
            existing.message = Some(message);
            existing.observed_generation = generation;
        } else {
            self.conditions.push(Condition {
                r#type: condition_type.to_string(),
                status: status.as_str().to_string(),
                reason: Some(reason.to_string()),
                message: Some(message),
                observed_generation: generation,
                last_transition_time: Some(now),
            });
        }
    }

    /// Record a `Ready` outcome for `generation`
    pub fn set_ready(
        &mut self,
        status: ConditionStatus,
        reason: &str,
        message: impl Into<String>,
        generation: Option<i64>,
        now: DateTime<Utc>,
    ) {
        self.set_condition(CONDITION_READY, status, reason, message, generation, now);
        self.observed_generation = generation;
    }

    /// Whether the `Ready` condition is currently `True`
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.condition(CONDITION_READY)
            .is_some_and(|c| c.status == ConditionStatus::True.as_str())
    }
}
