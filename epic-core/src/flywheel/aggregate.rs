use crate::models::{FlywheelProgress, Phase, PhaseStatus};

/// Overall completion as a whole percentage, rounded half up.
pub fn recompute(progress: &FlywheelProgress) -> u8 {
    let completed = progress
        .phases
        .iter()
        .filter(|phase| phase.status == PhaseStatus::Completed)
        .count();

    percent(completed, Phase::COUNT)
}

fn percent(completed: usize, total: usize) -> u8 {
    ((completed * 100 + total / 2) / total) as u8
}
