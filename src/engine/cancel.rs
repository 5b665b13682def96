use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// Tracks in-flight runs by id so another task can cancel them.
///
/// Only the caller that orchestrates runs holds one of these; the executor
/// itself just listens on the receiver it is handed. Entries leave the map on
/// `cancel` or `remove`; whoever calls `register` must call `remove` when the
/// run ends ([`Runner::run_registered`] does).
///
/// [`Runner::run_registered`]: crate::engine::runner::Runner::run_registered
#[derive(Debug, Default)]
pub struct CancelRegistry {
    senders: Mutex<HashMap<String, broadcast::Sender<()>>>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn senders(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<()>>> {
        self.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, id: &str) -> broadcast::Receiver<()> {
        let (tx, rx) = broadcast::channel(1);
        self.senders().insert(id.to_string(), tx);
        rx
    }

    /// Signal the run registered under `id`. Returns false when nothing was registered.
    pub fn cancel(&self, id: &str) -> bool {
        if let Some(tx) = self.senders().remove(id) {
            let _ = tx.send(());
            return true;
        }
        false
    }

    pub fn remove(&self, id: &str) {
        self.senders().remove(id);
    }

    pub fn len(&self) -> usize {
        self.senders().len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders().is_empty()
    }
}
