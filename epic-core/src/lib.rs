//! Core library for Epic AI.
//!
//! This crate provides the flywheel domain models, the phase gating and
//! progress logic, and the database operations behind them, independent of
//! any transport layer (HTTP, MCP, etc.).
//!
//! # Usage
//!
//! ```no_run
//! use epic_core::db::Database;
//! use epic_core::flywheel::build_state;
//! use uuid::Uuid;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let progress = db.get_or_create_progress(Uuid::new_v4())?;
//! let state = build_state(&progress);
//! assert_eq!(state.overall_progress, 0);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod db;
pub mod flywheel;
pub mod models;

// Re-export commonly used types at crate root
pub use db::Database;
