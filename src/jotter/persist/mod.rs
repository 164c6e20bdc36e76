//! # Persistence
//!
//! The note store itself never touches disk. Durable storage is an outside
//! collaborator reached through the [`StorageBackend`] trait, and its only
//! coupling back into the store is the advisory save status.
//!
//! ## Save Status Reporting
//!
//! [`Persister::persist`] takes a snapshot under the store lock, releases
//! the lock for the write, then reports the outcome:
//!
//! ```text
//! saved ──persist()──▶ saving ──write ok──▶ saved
//!                             └─write err─▶ error
//! ```
//!
//! A failed write is advisory. Local edits keep working and the next
//! successful persist (or commit) moves the status back to `saved`.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: Production store, one JSON file per data directory.
//! - [`mem_backend::MemBackend`]: For testing logic without filesystem I/O.
//!
//! ## Storage Layout
//!
//! ```text
//! <data dir>/
//! ├── notes.json     # Snapshot: notes with full version history + selection
//! └── jotter.toml    # Optional configuration
//! ```

use crate::error::Result;
use crate::model::SaveStatus;
use crate::store::{NoteStore, SharedStore};
use std::sync::Arc;

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;

pub use backend::StorageBackend;

#[derive(Clone)]
pub struct Persister {
    backend: Arc<dyn StorageBackend>,
}

impl Persister {
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn from_shared(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    /// Load the stored notes, or an empty store when nothing was saved yet.
    pub fn load(&self) -> Result<NoteStore> {
        match self.backend.load()? {
            Some(snapshot) => NoteStore::from_snapshot(snapshot),
            None => Ok(NoteStore::new()),
        }
    }

    /// Write the current state of `store`, reporting through its save status.
    pub fn persist(&self, store: &SharedStore) -> Result<()> {
        let snapshot = {
            let mut guard = store.lock();
            guard.set_save_status(SaveStatus::Saving);
            guard.snapshot()
        };

        let result = self.backend.save(&snapshot);

        let mut guard = store.lock();
        match &result {
            Ok(()) => guard.set_save_status(SaveStatus::Saved),
            Err(e) => {
                tracing::warn!("failed to persist notes to {:?}: {}", self.backend.location(), e);
                guard.set_save_status(SaveStatus::Error);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::mem_backend::MemBackend;
    use super::*;
    use crate::store::StoreEvent;

    fn shared_with_note() -> (SharedStore, Arc<MemBackend>) {
        let mut store = NoteStore::new();
        store.create_note("A", "x", None).unwrap();
        (store.into_shared(), Arc::new(MemBackend::new()))
    }

    #[test]
    fn test_persist_writes_snapshot_and_reports_saved() {
        let (store, backend) = shared_with_note();
        let persister = Persister::from_shared(backend.clone());
        let mut rx = store.lock().subscribe();

        persister.persist(&store).unwrap();

        assert_eq!(backend.save_count(), 1);
        assert_eq!(backend.stored().unwrap().notes.len(), 1);
        assert_eq!(store.lock().save_status(), SaveStatus::Saved);
        assert_eq!(
            rx.try_recv().unwrap(),
            StoreEvent::StatusChanged(SaveStatus::Saving)
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            StoreEvent::StatusChanged(SaveStatus::Saved)
        );
    }

    #[test]
    fn test_persist_failure_sets_error_status() {
        let (store, backend) = shared_with_note();
        backend.set_simulate_write_error(true);
        let persister = Persister::from_shared(backend.clone());

        assert!(persister.persist(&store).is_err());
        assert_eq!(store.lock().save_status(), SaveStatus::Error);

        // Local edits still work and clear the error on commit.
        let id = store.lock().selected_id().cloned().unwrap();
        store.lock().update_note(&id, "xy").unwrap();
        assert_eq!(store.lock().save_status(), SaveStatus::Saved);
    }

    #[test]
    fn test_load_empty_backend_gives_empty_store() {
        let persister = Persister::new(MemBackend::new());
        assert!(persister.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_round_trips_history() {
        let (store, backend) = shared_with_note();
        let id = store.lock().selected_id().cloned().unwrap();
        store.lock().update_note(&id, "xy").unwrap();
        let persister = Persister::from_shared(backend.clone());
        persister.persist(&store).unwrap();

        let loaded = persister.load().unwrap();
        let note = loaded.note(&id).unwrap();
        assert_eq!(note.version(), 2);
        assert_eq!(note.versions()[0].content, "x");
        assert_eq!(loaded.selected_id(), Some(&id));
    }
}
