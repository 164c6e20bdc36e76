//! # API Facade
//!
//! The API layer is a **thin facade** over [`NoteStore`] and [`Persister`].
//! It is the single entry point for UI clients, whether the CLI or an
//! editor embedding the library.
//!
//! ## Role and Responsibilities
//!
//! The facade:
//! - **Resolves selectors**: users type full ids or unique id prefixes
//! - **Persists** after every successful mutation
//! - **Returns owned data**, since the store lives behind a lock
//!
//! Business rules (cycle checks, version numbering, reparenting on delete)
//! live in the store. The facade does no printing or formatting.
//!
//! ## Persistence Failures
//!
//! A mutation that succeeded in memory but could not be written returns the
//! write error. The store's save status is `error` at that point and the
//! in-memory change is kept.
//!
//! ## Live Editing
//!
//! [`JotterApi::autosave`] starts an [`AutosaveHandle`] wired to this API's
//! store, persister and configured quiet period.

use crate::autosave::AutosaveHandle;
use crate::config::JotterConfig;
use crate::error::{JotterError, Result};
use crate::ledger::VersionEntry;
use crate::model::{Note, NoteId, PathSegment, SaveStatus};
use crate::persist::fs_backend::FsBackend;
use crate::persist::Persister;
use crate::store::{DoctorReport, NoteStore, SharedStore};
use std::path::{Path, PathBuf};

/// Summary of the store for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub note_count: usize,
    pub selected: Option<Vec<PathSegment>>,
    pub save_status: SaveStatus,
    pub location: PathBuf,
}

pub struct JotterApi {
    store: SharedStore,
    persister: Persister,
    config: JotterConfig,
}

impl JotterApi {
    /// Open the notes stored in `data_dir`, reading `jotter.toml` from there too.
    pub fn open_dir(data_dir: &Path) -> Result<Self> {
        let config = JotterConfig::load(data_dir)?;
        Self::open(Persister::new(FsBackend::new(data_dir)), config)
    }

    /// Load whatever `persister` holds.
    pub fn open(persister: Persister, config: JotterConfig) -> Result<Self> {
        let store = persister.load()?;
        Ok(Self::with_store(store, persister, config))
    }

    /// Use an already-built store, e.g. one with a custom clock or id source.
    pub fn with_store(store: NoteStore, persister: Persister, config: JotterConfig) -> Self {
        let store = store
            .with_placeholder_title(config.placeholder_title.clone())
            .into_shared();
        Self {
            store,
            persister,
            config,
        }
    }

    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    pub fn persister(&self) -> &Persister {
        &self.persister
    }

    pub fn config(&self) -> &JotterConfig {
        &self.config
    }

    /// Start autosave for the selected note.
    pub fn autosave(&self) -> AutosaveHandle {
        AutosaveHandle::spawn_with_persister(
            self.store.clone(),
            self.config.autosave(),
            self.persister.clone(),
        )
    }

    pub fn resolve(&self, selector: &str) -> Result<NoteId> {
        self.store.lock().resolve(selector)
    }

    // --- Mutations ---

    pub fn create_note(&self, title: &str, content: &str, parent: Option<&str>) -> Result<NoteId> {
        self.mutate(|store| {
            let parent = parent.map(|p| store.resolve(p)).transpose()?;
            store.create_note(title, content, parent.as_ref())
        })
    }

    pub fn update_note(&self, selector: &str, content: &str) -> Result<u64> {
        self.mutate(|store| {
            let id = store.resolve(selector)?;
            store.update_note(&id, content)
        })
    }

    pub fn rename_note(&self, selector: &str, title: &str) -> Result<()> {
        self.mutate(|store| {
            let id = store.resolve(selector)?;
            store.rename_note(&id, title)
        })
    }

    /// Reparent a note. `None` moves it to root.
    pub fn move_note(&self, selector: &str, parent: Option<&str>) -> Result<()> {
        self.mutate(|store| {
            let id = store.resolve(selector)?;
            let parent = parent.map(|p| store.resolve(p)).transpose()?;
            store.move_note(&id, parent.as_ref())
        })
    }

    pub fn reorder_note(&self, selector: &str, index: usize) -> Result<()> {
        self.mutate(|store| {
            let id = store.resolve(selector)?;
            store.reorder_note(&id, index)
        })
    }

    /// Delete a note, returning the deleted id and the children that moved up.
    pub fn delete_note(&self, selector: &str) -> Result<(NoteId, Vec<NoteId>)> {
        self.mutate(|store| {
            let id = store.resolve(selector)?;
            let reparented = store.delete_note(&id)?;
            Ok((id, reparented))
        })
    }

    pub fn restore_version(&self, selector: &str, version: u64) -> Result<u64> {
        self.mutate(|store| {
            let id = store.resolve(selector)?;
            store.restore_version(&id, version)
        })
    }

    /// Select a note, or clear the selection with `None`. A selector that
    /// names no note clears the selection too; an ambiguous one is an error.
    pub fn select_note(&self, selector: Option<&str>) -> Result<Option<NoteId>> {
        self.mutate(|store| {
            let id = match selector.map(|s| store.resolve(s)).transpose() {
                Ok(id) => id,
                Err(JotterError::NoteNotFound(_)) => None,
                Err(e) => return Err(e),
            };
            Ok(store.select_note(id.as_ref()))
        })
    }

    /// Repair dangling parents, cycles and a stale selection.
    pub fn doctor(&self) -> Result<DoctorReport> {
        let report = self.store.lock().doctor();
        if !report.is_clean() {
            self.persister.persist(&self.store)?;
        }
        Ok(report)
    }

    // --- Queries ---

    pub fn get_note(&self, selector: &str) -> Result<Note> {
        let store = self.store.lock();
        let id = store.resolve(selector)?;
        store.note(&id).cloned()
    }

    pub fn selected_note(&self) -> Option<Note> {
        self.store.lock().selected_note().cloned()
    }

    /// Depth-first listing of every note as `(depth, note)`.
    pub fn tree(&self) -> Vec<(usize, Note)> {
        self.store
            .lock()
            .tree()
            .into_iter()
            .map(|(depth, note)| (depth, note.clone()))
            .collect()
    }

    pub fn note_path(&self, selector: &str) -> Result<Vec<PathSegment>> {
        let store = self.store.lock();
        let id = store.resolve(selector)?;
        Ok(store.get_note_path(&id))
    }

    pub fn history(&self, selector: &str) -> Result<Vec<VersionEntry>> {
        let store = self.store.lock();
        let id = store.resolve(selector)?;
        Ok(store.note(&id)?.versions().to_vec())
    }

    pub fn status(&self) -> StatusReport {
        let store = self.store.lock();
        StatusReport {
            note_count: store.len(),
            selected: store.selected_id().map(|id| store.get_note_path(id)),
            save_status: store.save_status(),
            location: self.persister.backend().location(),
        }
    }

    fn mutate<T>(&self, op: impl FnOnce(&mut NoteStore) -> Result<T>) -> Result<T> {
        let out = {
            let mut store = self.store.lock();
            op(&mut *store)?
        };
        self.persister.persist(&self.store)?;
        Ok(out)
    }
}
