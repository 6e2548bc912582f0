//! KeyGate Core - Domain types
//!
//! This crate contains the fundamental types shared by every KeyGate crate:
//! - `Amount`: Non-negative decimal value carried by an execution
//! - `KeyId`: Fixed-width identifier of an authenticated key
//! - `Purpose` / `KeyType`: Privilege tags and algorithm family of a key
//! - `Address`: Target of an execution (the identity itself or an external party)
//! - `ExecutionId`: Sequential identifier of a queued execution

pub mod address;
pub mod amount;
pub mod key;

pub use address::{Address, ExecutionId};
pub use amount::{Amount, AmountError};
pub use key::{KeyId, KeyIdError, KeyType, Purpose};
