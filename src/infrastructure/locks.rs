use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed mutexes serializing check-then-write sequences.
///
/// Lifecycle operations lock by wish id and friendship operations by the
/// sorted user pair, so concurrent requests against the same entity cannot
/// interleave between the status check and the write. Locks are created
/// lazily and retained for the engine's lifetime.
#[derive(Default)]
pub struct LockManager {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: impl Into<String>) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(key.into()).or_default().clone()
        };
        lock.lock_owned().await
    }
}
