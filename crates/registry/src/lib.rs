//! KeyGate Registry - the identity's key set
//!
//! # Key Types
//! - `Key`: Identifier, purpose set and algorithm tag
//! - `KeyRegistry`: Unique keys, purpose queries, last-management-key guard
//! - `KeyDirective`: Payload of a self-call that mutates the registry
//!
//! The registry is owned by the authorization engine and only mutated by
//! dispatching an approved self-call.

pub mod directive;
pub mod error;
pub mod key;
pub mod registry;

pub use directive::{DirectiveError, KeyDirective};
pub use error::RegistryError;
pub use key::Key;
pub use registry::{KeyRegistry, RemovalOutcome};
