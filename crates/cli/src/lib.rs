//! KeyGate CLI - key tools, scenario runner and audit
//!
//! The binary lives in `main.rs`; the commands are exposed here so they can
//! be driven from integration tests.

pub mod commands;
pub mod scenario;

pub use commands::{RunReport, StepOutcome};
pub use scenario::{resolve_key, Scenario, Step};
