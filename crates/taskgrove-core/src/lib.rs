//! Core domain types and the task lifecycle engine for TaskGrove.

pub mod cascade;
pub mod engine;
pub mod error;
pub mod navigator;
pub mod order;
pub mod report;
pub mod store;
pub mod task;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
