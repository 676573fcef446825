//! Epic AI flywheel service.
//!
//! HTTP and MCP surfaces over the flywheel phase state machine and the
//! social autopilot dispatcher. Domain models, gating logic and storage
//! live in [`epic_core`].

pub mod api;
pub mod auth;
pub mod autopilot;
pub mod config;
pub mod mcp;

pub use epic_core::{db, flywheel, models};
