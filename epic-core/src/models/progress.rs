use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::phase::{Phase, PhaseStatus};

/// Stored state of a single phase for one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhaseProgress {
    pub status: PhaseStatus,
    pub step: u32,
    /// Wizard form state. Not validated at this layer.
    pub data: Value,
}

impl Default for PhaseProgress {
    fn default() -> Self {
        Self {
            status: PhaseStatus::NotStarted,
            step: 0,
            data: Value::Object(Default::default()),
        }
    }
}

/// Per-user flywheel record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlywheelProgress {
    pub user_id: Uuid,
    /// Indexed by [`Phase::index`].
    pub phases: [PhaseProgress; Phase::COUNT],
    pub overall_progress: u8,
    pub flywheel_active: bool,
    pub activated_at: Option<DateTime<Utc>>,
    pub last_active_phase: Option<Phase>,
    pub last_active_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FlywheelProgress {
    /// A fresh record with every phase `NOT_STARTED`.
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            phases: Default::default(),
            overall_progress: 0,
            flywheel_active: false,
            activated_at: None,
            last_active_phase: None,
            last_active_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn phase(&self, phase: Phase) -> &PhaseProgress {
        &self.phases[phase.index()]
    }

    pub fn phase_mut(&mut self, phase: Phase) -> &mut PhaseProgress {
        &mut self.phases[phase.index()]
    }

    pub fn completed_phases(&self) -> Vec<Phase> {
        Phase::ALL
            .into_iter()
            .filter(|phase| self.phase(*phase).status == PhaseStatus::Completed)
            .collect()
    }
}

/// A validated phase write. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseUpdate {
    pub status: Option<PhaseStatus>,
    pub step: Option<u32>,
    pub data: Option<Value>,
}

/// Request body for a phase write, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePhaseInput {
    pub status: Option<PhaseStatus>,
    pub current_step: Option<i64>,
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActivationResult {
    Activated(FlywheelProgress),
    Blocked(Vec<Phase>),
}

/// Read-side view of one phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhaseState {
    pub phase: Phase,
    pub status: PhaseStatus,
    pub current_step: u32,
    pub total_steps: u32,
    pub data: Value,
    pub is_blocked: bool,
    pub blocked_by: Vec<Phase>,
}

/// Everything the UI needs to render the flywheel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlywheelState {
    pub phases: BTreeMap<Phase, PhaseState>,
    pub overall_progress: u8,
    pub flywheel_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active_phase: Option<Phase>,
    pub last_active_at: Option<DateTime<Utc>>,
}
