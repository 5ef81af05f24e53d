//! Pipeline entry points for air-quality operations.
//!
//! - `run_query`: Look up one location through the cached service
//! - `spawn_sweeper` / `run_sweep`: Remove expired cache entries

pub mod query;
pub mod sweep;

pub use query::{render_card, run_query};
pub use sweep::{SweeperHandle, run_sweep, spawn_sweeper};
