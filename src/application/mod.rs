//! Application layer: the `Engine` facade orchestrating ledger, lifecycle,
//! dispute, and friendship operations over the storage ports.
//!
//! Every operation runs as one atomic unit: business rules are checked
//! before any mutation, and multi-row mutations go through a single
//! all-or-nothing ledger commit or are serialized under a per-entity lock.

pub mod disputes;
pub mod engine;
pub mod events;
pub mod exchange;
pub mod friends;
pub mod ledger;
pub mod wishes;

/// Retries an idempotent read exactly once on a storage failure.
///
/// Mutations must never go through this; a transparently retried write risks
/// a double effect.
macro_rules! retry_once {
    ($expr:expr) => {
        match $expr {
            Err($crate::error::EngineError::Storage(_)) => $expr,
            other => other,
        }
    };
}
pub(crate) use retry_once;
