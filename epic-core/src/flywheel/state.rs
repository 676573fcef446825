use std::collections::BTreeMap;

use crate::models::{FlywheelProgress, FlywheelState, Phase, PhaseState};

use super::gate;

/// Assembles the read-side view of a progress record.
///
/// Pure: the same record always yields the same state.
pub fn build_state(progress: &FlywheelProgress) -> FlywheelState {
    let completed = progress.completed_phases();

    let phases: BTreeMap<Phase, PhaseState> = Phase::ALL
        .into_iter()
        .map(|phase| {
            let stored = progress.phase(phase);
            let blocked_by = gate::blocking_phases(phase, &completed);
            let state = PhaseState {
                phase,
                status: stored.status,
                current_step: stored.step,
                total_steps: phase.total_steps(),
                data: stored.data.clone(),
                is_blocked: !blocked_by.is_empty(),
                blocked_by,
            };
            (phase, state)
        })
        .collect();

    FlywheelState {
        phases,
        overall_progress: progress.overall_progress,
        flywheel_active: progress.flywheel_active,
        activated_at: progress.activated_at,
        last_active_phase: progress.last_active_phase,
        last_active_at: progress.last_active_at,
    }
}
