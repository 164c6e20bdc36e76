//! # Hierarchy Index
//!
//! Notes are stored flat, keyed by id. The tree is never materialized: every
//! query here derives it from the current parent links, so results can't go
//! stale after a move or delete.
//!
//! ## Walking up
//!
//! [`Hierarchy::path_to`] and [`Hierarchy::would_create_cycle`] follow
//! `parent_id` links upward. A missing ancestor ends the walk quietly (the
//! path is truncated, not an error). Both walks track visited ids so they
//! terminate even on data that already contains a cycle, though the store
//! never lets one be created.
//!
//! ## Sibling order
//!
//! Children are returned sorted by each note's `order` key, with the id as a
//! tiebreaker so the result never depends on map iteration order.

use crate::model::{Note, NoteId, PathSegment};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

fn sibling_order(a: &&Note, b: &&Note) -> Ordering {
    a.order().cmp(&b.order()).then_with(|| a.id().cmp(b.id()))
}

pub struct Hierarchy<'a> {
    notes: &'a HashMap<NoteId, Note>,
}

impl<'a> Hierarchy<'a> {
    pub fn new(notes: &'a HashMap<NoteId, Note>) -> Self {
        Self { notes }
    }

    /// Children of `parent`, or root notes when `parent` is `None`.
    pub fn children_of(&self, parent: Option<&NoteId>) -> Vec<&'a Note> {
        let mut children: Vec<&Note> = self
            .notes
            .values()
            .filter(|n| n.parent_id() == parent)
            .collect();
        children.sort_by(sibling_order);
        children
    }

    /// Root-first breadcrumb path ending at `id`.
    ///
    /// Returns an empty path for an unknown id.
    pub fn path_to(&self, id: &NoteId) -> Vec<PathSegment> {
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(id);

        while let Some(current_id) = current {
            if !visited.insert(current_id) {
                tracing::warn!("cycle detected while resolving path for {}", id);
                break;
            }
            let Some(note) = self.notes.get(current_id) else {
                break;
            };
            path.push(PathSegment {
                id: note.id().clone(),
                title: note.title().to_string(),
            });
            current = note.parent_id();
        }

        path.reverse();
        path
    }

    /// Would placing `id` under `proposed_parent` make `id` its own ancestor?
    pub fn would_create_cycle(&self, id: &NoteId, proposed_parent: &NoteId) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(proposed_parent);

        while let Some(current_id) = current {
            if current_id == id {
                return true;
            }
            if !visited.insert(current_id) {
                // Pre-existing loop that does not pass through `id`.
                return false;
            }
            current = self.notes.get(current_id).and_then(|n| n.parent_id());
        }
        false
    }

    /// True when `ancestor` appears on the parent chain of `id`.
    pub fn is_descendant_of(&self, id: &NoteId, ancestor: &NoteId) -> bool {
        self.notes
            .get(id)
            .and_then(|n| n.parent_id())
            .is_some_and(|parent| self.would_create_cycle(ancestor, parent))
    }

    /// Depth-first listing of the whole tree as `(depth, note)`, roots at depth 0.
    pub fn tree(&self) -> Vec<(usize, &'a Note)> {
        let index = self.child_index();
        let mut out = Vec::with_capacity(self.notes.len());
        let mut visited = HashSet::new();
        let mut stack: Vec<(usize, &'a Note)> = Vec::new();

        if let Some(roots) = index.get(&None) {
            stack.extend(roots.iter().rev().map(|note| (0, *note)));
        }
        while let Some((depth, note)) = stack.pop() {
            if !visited.insert(note.id()) {
                continue;
            }
            out.push((depth, note));
            if let Some(children) = index.get(&Some(note.id())) {
                stack.extend(children.iter().rev().map(|child| (depth + 1, *child)));
            }
        }
        out
    }

    /// Children of every parent (`None` for roots), each list in sibling order.
    fn child_index(&self) -> HashMap<Option<&'a NoteId>, Vec<&'a Note>> {
        let mut index: HashMap<Option<&'a NoteId>, Vec<&'a Note>> = HashMap::new();
        for note in self.notes.values() {
            index.entry(note.parent_id()).or_default().push(note);
        }
        for children in index.values_mut() {
            children.sort_by(sibling_order);
        }
        index
    }

    /// Notes whose parent link points at an id that is not in the collection.
    pub fn dangling(&self) -> Vec<&'a NoteId> {
        let mut ids: Vec<&NoteId> = self
            .notes
            .values()
            .filter(|n| n.parent_id().is_some_and(|p| !self.notes.contains_key(p)))
            .map(|n| n.id())
            .collect();
        ids.sort();
        ids
    }

    /// Notes that sit on a parent-link loop.
    ///
    /// Each note is walked at most once: a walk stops at the first note an
    /// earlier walk already settled.
    pub fn cyclic(&self) -> Vec<&'a NoteId> {
        let mut settled: HashSet<&'a NoteId> = HashSet::new();
        let mut on_loop = Vec::new();

        for start in self.notes.keys() {
            let mut path: Vec<&'a NoteId> = Vec::new();
            let mut position: HashMap<&'a NoteId, usize> = HashMap::new();
            let mut current = Some(start);

            while let Some(id) = current {
                if settled.contains(id) {
                    break;
                }
                if let Some(&at) = position.get(id) {
                    on_loop.extend_from_slice(&path[at..]);
                    break;
                }
                let Some(note) = self.notes.get(id) else {
                    break;
                };
                position.insert(note.id(), path.len());
                path.push(note.id());
                current = note.parent_id();
            }
            settled.extend(path);
        }

        on_loop.sort();
        on_loop
    }
}
