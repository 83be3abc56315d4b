//! Same-device broadcast channel between settings instances.

use std::fmt;

use tokio::sync::broadcast;

use crate::settings::Category;
use crate::store::CategoryState;

const DEFAULT_CAPACITY: usize = 64;

/// Random per-instance identity used to ignore our own broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    pub fn random() -> Self {
        Self(rand::random())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A full layer snapshot of one category, stamped with its revision.
#[derive(Debug, Clone)]
pub struct SyncMessage {
    pub origin: InstanceId,
    pub category: Category,
    pub revision: u64,
    pub state: CategoryState,
}

impl SyncMessage {
    pub fn new(origin: InstanceId, state: CategoryState) -> Self {
        Self {
            origin,
            category: state.category(),
            revision: state.revision(),
            state,
        }
    }
}

/// Fire-and-forget fan-out. Clones share the same channel.
#[derive(Debug, Clone)]
pub struct SyncBus {
    tx: broadcast::Sender<SyncMessage>,
}

impl SyncBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns how many receivers saw the message; zero is not an error.
    pub fn publish(&self, message: SyncMessage) -> usize {
        self.tx.send(message).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncMessage> {
        self.tx.subscribe()
    }
}

impl Default for SyncBus {
    fn default() -> Self {
        Self::new()
    }
}
