//! KeyGate Engine - key-based execution authorization
//!
//! ```text
//! execute(caller, target, value, payload)
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ Purpose check               │ ← ACTION or MANAGEMENT,
//! │                             │   MANAGEMENT only for self-calls
//! └─────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ Execution queue             │ ← append-only, sequential ids
//! └─────────────────────────────┘
//!     │  approve(caller, id) × N
//!     ▼
//! ┌─────────────────────────────┐
//! │ Quorum (live threshold)     │
//! └─────────────────────────────┘
//!     │  exactly once
//!     ▼
//! ┌─────────────────────────────┐
//! │ Dispatcher                  │ ← self-call: key directive
//! │                             │   otherwise: action sink
//! └─────────────────────────────┘
//! ```

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod execution;
pub mod policy;
pub mod queue;
pub mod shared;
pub mod sink;

pub use config::{ConfigError, EngineConfig};
pub use dispatcher::Dispatcher;
pub use engine::{ApprovalStatus, AuthorizationEngine};
pub use error::{EngineError, EngineResult, Resource};
pub use execution::{Execution, ProposerRole};
pub use policy::{PurposeRequirement, QuorumPolicy};
pub use queue::{ExecutionQueue, QueueStats};
pub use shared::SharedEngine;
pub use sink::{ActionSink, Delivery, InMemoryLedger, RejectingSink, SinkError};

pub use keygate_events::{DispatchOutcome, EngineEvent, EventRecord};
