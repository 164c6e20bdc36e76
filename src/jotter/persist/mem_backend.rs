use super::backend::StorageBackend;
use crate::error::{JotterError, Result};
use crate::store::Snapshot;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory storage backend for testing.
///
/// Uses a `Mutex` rather than `RefCell` because the autosave coordinator
/// persists from a tokio task, so backends must be `Sync`.
#[derive(Default)]
pub struct MemBackend {
    snapshot: Mutex<Option<Snapshot>>,
    saves: AtomicUsize,
    simulate_write_error: AtomicBool,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start out holding `snapshot`, as if it had been saved earlier.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Option<Snapshot> {
        self.snapshot.lock().clone()
    }
}

impl StorageBackend for MemBackend {
    fn load(&self) -> Result<Option<Snapshot>> {
        Ok(self.snapshot.lock().clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(JotterError::Store("Simulated write error".to_string()));
        }
        *self.snapshot.lock() = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> PathBuf {
        PathBuf::from("memory://notes")
    }
}
