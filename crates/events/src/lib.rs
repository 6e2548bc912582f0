//! KeyGate Events - engine events and the JSONL audit log
//!
//! The engine buffers an `EventRecord` for every state transition. Consumers
//! drain the buffer and append it to the audit log; the log is append-only
//! and partitioned into one JSONL file per day.

pub mod audit;
pub mod error;
pub mod event;
pub mod reader;
pub mod store;

pub use audit::{verify_single_dispatch, AuditSummary};
pub use error::EventError;
pub use event::{DispatchOutcome, EngineEvent, EventRecord};
pub use reader::EventReader;
pub use store::EventStore;
