//! Dependency gating over the fixed phase chain.
//!
//! A phase is blocked while any phase declared before it is incomplete.
//! The chain is total, so there is nothing to detect cycles in.

use crate::models::Phase;

/// Phases that must complete before `phase` unblocks, in chain order.
pub fn blocking_phases(phase: Phase, completed: &[Phase]) -> Vec<Phase> {
    Phase::ALL[..phase.index()]
        .iter()
        .copied()
        .filter(|earlier| !completed.contains(earlier))
        .collect()
}

pub fn is_phase_blocked(phase: Phase, completed: &[Phase]) -> bool {
    Phase::ALL[..phase.index()]
        .iter()
        .any(|earlier| !completed.contains(earlier))
}
