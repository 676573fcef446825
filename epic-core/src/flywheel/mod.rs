//! Flywheel phase logic: dependency gating, progress aggregation and the
//! state builder consumed by the API layer.
//!
//! Everything here is a pure function of a [`FlywheelProgress`] record;
//! persistence lives in [`crate::db`].
//!
//! [`FlywheelProgress`]: crate::models::FlywheelProgress

pub mod aggregate;
pub mod gate;
mod guided;
mod state;

pub use aggregate::recompute;
pub use gate::{blocking_phases, is_phase_blocked};
pub use guided::merge_guided_data;
pub use state::build_state;
