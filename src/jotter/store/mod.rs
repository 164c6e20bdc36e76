//! # Note Store
//!
//! [`NoteStore`] is the single owner of the note collection. Every mutation
//! goes through it, and it also owns the two pieces of process-wide state:
//! which note is selected and the advisory [`SaveStatus`].
//!
//! ## Commands and Queries
//!
//! | Command | Effect |
//! |---------|--------|
//! | [`create_note`](NoteStore::create_note) | New note at version 1, becomes the selection |
//! | [`update_note`](NoteStore::update_note) | New version; save status becomes `saved` |
//! | [`rename_note`](NoteStore::rename_note) | Title change, empty titles become the placeholder |
//! | [`move_note`](NoteStore::move_note) | Reparent after a cycle check; no new version |
//! | [`reorder_note`](NoteStore::reorder_note) | Reposition within the sibling group |
//! | [`delete_note`](NoteStore::delete_note) | Remove; children move up to the deleted note's parent |
//! | [`restore_version`](NoteStore::restore_version) | Append an old snapshot as a new version |
//! | [`select_note`](NoteStore::select_note) | Change selection; unknown ids select nothing |
//!
//! Queries ([`get_note_path`](NoteStore::get_note_path),
//! [`children_of`](NoteStore::children_of), [`tree`](NoteStore::tree)) go
//! through the [`Hierarchy`] view so callers never touch it directly.
//!
//! ## Failure Atomicity
//!
//! Commands validate before they write. A rejected move or an unknown id
//! leaves the collection exactly as it was.
//!
//! ## Observing Changes
//!
//! [`NoteStore::subscribe`] hands out a broadcast receiver of
//! [`StoreEvent`]s. Sending never blocks and is skipped when nobody listens.
//!
//! ## Snapshots
//!
//! [`Snapshot`] is the persisted form of the store: notes in sibling order
//! plus the selection. [`NoteStore::from_snapshot`] rejects data that breaks
//! ledger or entity invariants, then repairs structural damage the same way
//! [`NoteStore::doctor`] does.

use crate::clock::{Clock, SystemClock};
use crate::error::{HierarchyViolation, JotterError, Result};
use crate::ids::{IdGenerator, UuidIds};
use crate::model::{Note, NoteId, PathSegment, SaveStatus, DEFAULT_PLACEHOLDER_TITLE};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast;

pub mod hierarchy;

pub use hierarchy::Hierarchy;

/// A store shared between the UI thread and the autosave task.
pub type SharedStore = Arc<Mutex<NoteStore>>;

const EVENT_CAPACITY: usize = 256;
const SNAPSHOT_FORMAT: u32 = 1;

/// Change notifications published by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Created {
        id: NoteId,
    },
    Updated {
        id: NoteId,
        version: u64,
    },
    Renamed {
        id: NoteId,
    },
    Moved {
        id: NoteId,
        from: Option<NoteId>,
        to: Option<NoteId>,
    },
    Reordered {
        id: NoteId,
    },
    Deleted {
        id: NoteId,
        reparented: Vec<NoteId>,
    },
    Selected(Option<NoteId>),
    StatusChanged(SaveStatus),
}

/// Persisted form of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "default_format")]
    pub format: u32,
    pub notes: Vec<Note>,
    #[serde(default)]
    pub selected_note_id: Option<NoteId>,
}

fn default_format() -> u32 {
    SNAPSHOT_FORMAT
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            format: SNAPSHOT_FORMAT,
            notes: Vec::new(),
            selected_note_id: None,
        }
    }
}

/// Report from the `doctor` operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DoctorReport {
    /// Notes whose parent no longer existed, now at root.
    pub orphans_promoted: usize,
    /// Notes cut loose from a parent-link loop, now at root.
    pub cycles_broken: usize,
    /// A selection that pointed at a missing note was cleared.
    pub selection_cleared: bool,
}

impl DoctorReport {
    pub fn is_clean(&self) -> bool {
        self.orphans_promoted == 0 && self.cycles_broken == 0 && !self.selection_cleared
    }
}

pub struct NoteStore {
    notes: HashMap<NoteId, Note>,
    selected: Option<NoteId>,
    save_status: SaveStatus,
    next_order: u64,
    last_tick: Option<DateTime<Utc>>,
    placeholder_title: String,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for NoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteStore")
            .field("notes", &self.notes.len())
            .field("selected", &self.selected)
            .field("save_status", &self.save_status)
            .finish()
    }
}

impl NoteStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            notes: HashMap::new(),
            selected: None,
            save_status: SaveStatus::Saved,
            next_order: 0,
            last_tick: None,
            placeholder_title: DEFAULT_PLACEHOLDER_TITLE.to_string(),
            ids: Box::new(UuidIds),
            clock: Box::new(SystemClock),
            events,
        }
    }

    pub fn with_ids(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_placeholder_title(mut self, title: impl Into<String>) -> Self {
        self.placeholder_title = title.into();
        self
    }

    /// Wrap the store for sharing across tasks. All commands then run under
    /// the one lock, so they cannot interleave.
    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // --- Commands ---

    /// Create a note and select it.
    pub fn create_note(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
        parent_id: Option<&NoteId>,
    ) -> Result<NoteId> {
        if let Some(parent) = parent_id {
            if !self.notes.contains_key(parent) {
                return Err(HierarchyViolation::MissingParent(parent.clone()).into());
            }
        }

        let id = self.ids.generate_id();
        if self.notes.contains_key(&id) {
            return Err(JotterError::Store(format!(
                "identifier {} was issued twice",
                id
            )));
        }

        let now = self.tick();
        let mut note = Note::new(id.clone(), title, content, parent_id.cloned(), now);
        note.set_order(self.take_order());
        self.notes.insert(id.clone(), note);
        tracing::debug!("created note {}", id);
        self.emit(StoreEvent::Created { id: id.clone() });

        self.selected = Some(id.clone());
        self.emit(StoreEvent::Selected(Some(id.clone())));
        Ok(id)
    }

    /// Commit new content as the next version. Returns the new version number.
    pub fn update_note(&mut self, id: &NoteId, content: impl Into<String>) -> Result<u64> {
        let now = self.tick();
        let note = self
            .notes
            .get_mut(id)
            .ok_or_else(|| JotterError::NoteNotFound(id.clone()))?;
        let version = note.set_content(content, now);
        tracing::debug!("note {} committed version {}", id, version);
        self.emit(StoreEvent::Updated {
            id: id.clone(),
            version,
        });
        self.set_save_status(SaveStatus::Saved);
        Ok(version)
    }

    pub fn rename_note(&mut self, id: &NoteId, title: impl Into<String>) -> Result<()> {
        let now = self.tick();
        let note = self
            .notes
            .get_mut(id)
            .ok_or_else(|| JotterError::NoteNotFound(id.clone()))?;
        note.rename(title, &self.placeholder_title, now);
        self.emit(StoreEvent::Renamed { id: id.clone() });
        Ok(())
    }

    /// Reparent `id` under `new_parent` (or to root). The note lands last
    /// among its new siblings. Content history is untouched.
    pub fn move_note(&mut self, id: &NoteId, new_parent: Option<&NoteId>) -> Result<()> {
        let current_parent = self
            .notes
            .get(id)
            .ok_or_else(|| JotterError::NoteNotFound(id.clone()))?
            .parent_id()
            .cloned();

        if let Some(parent) = new_parent {
            if parent == id {
                return Err(HierarchyViolation::SelfParent(id.clone()).into());
            }
            if !self.notes.contains_key(parent) {
                return Err(HierarchyViolation::MissingParent(parent.clone()).into());
            }
            if self.hierarchy().would_create_cycle(id, parent) {
                return Err(HierarchyViolation::Cycle {
                    id: id.clone(),
                    parent: parent.clone(),
                }
                .into());
            }
        }

        if current_parent.as_ref() == new_parent {
            return Ok(());
        }

        let order = self.take_order();
        if let Some(note) = self.notes.get_mut(id) {
            note.set_parent(new_parent.cloned());
            note.set_order(order);
        }
        tracing::debug!("moved note {} from {:?} to {:?}", id, current_parent, new_parent);
        self.emit(StoreEvent::Moved {
            id: id.clone(),
            from: current_parent,
            to: new_parent.cloned(),
        });
        Ok(())
    }

    /// Place `id` at `index` within its sibling group. Indexes past the end
    /// place it last.
    pub fn reorder_note(&mut self, id: &NoteId, index: usize) -> Result<()> {
        let parent = self
            .notes
            .get(id)
            .ok_or_else(|| JotterError::NoteNotFound(id.clone()))?
            .parent_id()
            .cloned();

        let mut siblings: Vec<NoteId> = self
            .hierarchy()
            .children_of(parent.as_ref())
            .into_iter()
            .map(|n| n.id().clone())
            .filter(|sid| sid != id)
            .collect();
        let index = index.min(siblings.len());
        siblings.insert(index, id.clone());

        for sid in siblings {
            let order = self.take_order();
            if let Some(note) = self.notes.get_mut(&sid) {
                note.set_order(order);
            }
        }
        self.emit(StoreEvent::Reordered { id: id.clone() });
        Ok(())
    }

    /// Remove a note. Its children are reparented to the deleted note's
    /// parent (or promoted to root), keeping their relative order and landing
    /// after the existing siblings there. Returns the reparented ids in that
    /// order.
    pub fn delete_note(&mut self, id: &NoteId) -> Result<Vec<NoteId>> {
        if !self.notes.contains_key(id) {
            return Err(JotterError::NoteNotFound(id.clone()));
        }
        let reparented: Vec<NoteId> = self
            .children_of(Some(id))
            .into_iter()
            .map(|n| n.id().clone())
            .collect();
        let new_parent = self
            .notes
            .remove(id)
            .and_then(|removed| removed.parent_id().cloned());

        for child in &reparented {
            let order = self.take_order();
            if let Some(note) = self.notes.get_mut(child) {
                note.set_parent(new_parent.clone());
                note.set_order(order);
            }
        }
        tracing::debug!(
            "deleted note {}, {} children moved up",
            id,
            reparented.len()
        );
        self.emit(StoreEvent::Deleted {
            id: id.clone(),
            reparented: reparented.clone(),
        });

        if self.selected.as_ref() == Some(id) {
            self.selected = None;
            self.emit(StoreEvent::Selected(None));
        }
        Ok(reparented)
    }

    /// Append the content of `version` as a new version. History only moves
    /// forward: nothing after `version` is discarded.
    pub fn restore_version(&mut self, id: &NoteId, version: u64) -> Result<u64> {
        let content = self
            .notes
            .get(id)
            .ok_or_else(|| JotterError::NoteNotFound(id.clone()))?
            .ledger()
            .get(version)
            .map(|entry| entry.content.clone())
            .ok_or_else(|| JotterError::VersionNotFound {
                id: id.clone(),
                version,
            })?;
        self.update_note(id, content)
    }

    /// Select a note, or nothing. Unknown ids select nothing.
    pub fn select_note(&mut self, id: Option<&NoteId>) -> Option<NoteId> {
        let selected = id.filter(|id| self.notes.contains_key(*id)).cloned();
        if selected.is_none() && id.is_some() {
            tracing::debug!("ignoring selection of unknown note {:?}", id);
        }
        if self.selected != selected {
            self.selected = selected.clone();
            self.emit(StoreEvent::Selected(selected.clone()));
        }
        selected
    }

    /// Accept a status reported by a persistence layer.
    pub fn set_save_status(&mut self, status: SaveStatus) {
        if self.save_status != status {
            self.save_status = status;
            self.emit(StoreEvent::StatusChanged(status));
        }
    }

    // --- Queries ---

    pub fn save_status(&self) -> SaveStatus {
        self.save_status
    }

    pub fn selected_id(&self) -> Option<&NoteId> {
        self.selected.as_ref()
    }

    pub fn selected_note(&self) -> Option<&Note> {
        self.selected.as_ref().and_then(|id| self.notes.get(id))
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn note(&self, id: &NoteId) -> Result<&Note> {
        self.notes
            .get(id)
            .ok_or_else(|| JotterError::NoteNotFound(id.clone()))
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.notes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Root-first breadcrumbs for `id`. Empty for unknown ids.
    pub fn get_note_path(&self, id: &NoteId) -> Vec<PathSegment> {
        self.hierarchy().path_to(id)
    }

    pub fn children_of(&self, parent: Option<&NoteId>) -> Vec<&Note> {
        self.hierarchy().children_of(parent)
    }

    pub fn tree(&self) -> Vec<(usize, &Note)> {
        self.hierarchy().tree()
    }

    pub fn hierarchy(&self) -> Hierarchy<'_> {
        Hierarchy::new(&self.notes)
    }

    /// Resolve a full id or a unique id prefix.
    pub fn resolve(&self, input: &str) -> Result<NoteId> {
        let exact = NoteId::from(input);
        if self.notes.contains_key(&exact) {
            return Ok(exact);
        }
        let mut matches = self.notes.keys().filter(|id| id.as_str().starts_with(input));
        match (matches.next(), matches.next()) {
            (Some(id), None) if !input.is_empty() => Ok(id.clone()),
            (Some(_), Some(_)) => Err(JotterError::AmbiguousId(input.to_string())),
            _ => Err(JotterError::NoteNotFound(exact)),
        }
    }

    // --- Snapshots ---

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            format: SNAPSHOT_FORMAT,
            notes: self.tree_order(),
            selected_note_id: self.selected.clone(),
        }
    }

    /// Rebuild a store from persisted state. Invariant violations are
    /// rejected; broken parent links are repaired.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let mut store = Self::new();
        store.restore_snapshot(snapshot)?;
        Ok(store)
    }

    /// Replace this store's contents with `snapshot`, keeping its id
    /// generator, clock and subscribers.
    pub fn restore_snapshot(&mut self, snapshot: Snapshot) -> Result<DoctorReport> {
        if snapshot.format > SNAPSHOT_FORMAT {
            return Err(JotterError::Corrupt(format!(
                "snapshot format {} is newer than supported format {}",
                snapshot.format, SNAPSHOT_FORMAT
            )));
        }

        let mut notes = HashMap::with_capacity(snapshot.notes.len());
        let mut next_order = 0;
        let mut last_tick: Option<DateTime<Utc>> = None;
        for note in snapshot.notes {
            note.check_integrity().map_err(JotterError::Corrupt)?;
            next_order = next_order.max(note.order() + 1);
            last_tick = last_tick.max(Some(note.updated_at()));
            if let Some(dup) = notes.insert(note.id().clone(), note) {
                return Err(JotterError::Corrupt(format!(
                    "note {} appears more than once",
                    dup.id()
                )));
            }
        }

        self.notes = notes;
        self.selected = snapshot.selected_note_id;
        self.next_order = next_order;
        self.last_tick = last_tick;

        let report = self.doctor();
        if !report.is_clean() {
            tracing::warn!("repaired loaded notes: {:?}", report);
        }
        tracing::info!("loaded {} notes", self.notes.len());
        Ok(report)
    }

    /// Repair structural damage: promote notes with missing parents and
    /// notes caught in parent-link loops to root, and clear a selection that
    /// points nowhere.
    pub fn doctor(&mut self) -> DoctorReport {
        let mut report = DoctorReport::default();

        let dangling: Vec<NoteId> = self.hierarchy().dangling().into_iter().cloned().collect();
        for id in dangling {
            if let Some(note) = self.notes.get_mut(&id) {
                note.set_parent(None);
                report.orphans_promoted += 1;
            }
        }

        // Break loops one link at a time: cutting one note loose can free
        // the rest of its loop.
        loop {
            let cyclic: Vec<NoteId> = self.hierarchy().cyclic().into_iter().cloned().collect();
            let Some(id) = cyclic.into_iter().next() else {
                break;
            };
            if let Some(note) = self.notes.get_mut(&id) {
                note.set_parent(None);
                report.cycles_broken += 1;
            }
        }

        if let Some(selected) = &self.selected {
            if !self.notes.contains_key(selected) {
                self.selected = None;
                report.selection_cleared = true;
            }
        }
        report
    }

    // --- Internals ---

    fn tree_order(&self) -> Vec<Note> {
        let hierarchy = self.hierarchy();
        let listed = hierarchy.tree();
        let seen: HashSet<&NoteId> = listed.iter().map(|(_, n)| n.id()).collect();
        let mut out: Vec<Note> = listed.iter().map(|(_, n)| (*n).clone()).collect();

        // Anything unreachable from a root (only possible before doctor runs).
        let mut rest: Vec<&Note> = self
            .notes
            .values()
            .filter(|n| !seen.contains(n.id()))
            .collect();
        rest.sort_by(|a, b| a.order().cmp(&b.order()).then_with(|| a.id().cmp(b.id())));
        out.extend(rest.into_iter().cloned());
        out
    }

    fn take_order(&mut self) -> u64 {
        let order = self.next_order;
        self.next_order += 1;
        order
    }

    /// Current time, never earlier than the last time handed out.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = self.clock.now();
        let now = match self.last_tick {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_tick = Some(now);
        now
    }

    fn emit(&self, event: StoreEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests;
