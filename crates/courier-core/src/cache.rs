//! Response cache and change stream.
//!
//! The cache keeps the latest result per contract identity and never deletes
//! an entry, only overwrites it. Change detection compares raw-payload
//! content hashes; an absent entry counts as changed. Publication goes
//! through a broadcast channel so any number of listeners can subscribe,
//! and a send with no listeners is not an error.
//!
//! Concurrent calls for the same contract are not serialized: the
//! compare-and-publish step is last-write-wins, so two racing identical
//! calls can duplicate or drop a publication. Callers needing exactly-once
//! publish semantics must layer per-identity coalescing on top.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use courier_contracts::{ContractId, ExecutionResult};

/// Broadcast capacity; slow listeners past this lag see a `Lagged` error.
const CHANGE_STREAM_CAPACITY: usize = 64;

/// Latest-result store keyed by contract identity.
#[derive(Default)]
pub(crate) struct ResponseCache {
    entries: Mutex<HashMap<ContractId, ExecutionResult>>,
}

impl ResponseCache {
    /// Overwrites the entry for the result's identity and reports whether
    /// the content hash changed relative to the previous entry.
    pub(crate) fn register(&self, result: &ExecutionResult) -> bool {
        let mut entries = self.entries.lock();
        let changed = entries
            .get(&result.id)
            .is_none_or(|previous| previous.hash != result.hash);
        entries.insert(result.id, result.clone());
        changed
    }

    /// Returns the latest cached result for an identity.
    pub(crate) fn latest(&self, id: ContractId) -> Option<ExecutionResult> {
        self.entries.lock().get(&id).cloned()
    }
}

/// Fire-and-forget broadcast of changed, successful results.
pub(crate) struct ChangeStream {
    sender: broadcast::Sender<ExecutionResult>,
}

impl Default for ChangeStream {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(CHANGE_STREAM_CAPACITY);
        Self { sender }
    }
}

impl ChangeStream {
    /// Subscribes a new independent listener.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ExecutionResult> {
        self.sender.subscribe()
    }

    /// Publishes a result; listeners receive it in publication order.
    pub(crate) fn publish(&self, result: &ExecutionResult) {
        // No listeners is fine; the stream is best-effort by design.
        let _ = self.sender.send(result.clone());
    }
}
