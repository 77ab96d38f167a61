//! Core domain types and operations for the track time tracker.

pub mod config;
pub mod duration;
pub mod report;
pub mod store;
pub mod task_ops;
pub mod timer;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
