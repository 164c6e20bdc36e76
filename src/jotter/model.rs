//! # Domain Model
//!
//! This module defines the core data types for jotter: [`Note`], [`NoteId`],
//! [`SaveStatus`] and [`PathSegment`].
//!
//! ## Notes
//!
//! A note is a titled document with a current content snapshot, an optional
//! parent link and a [`VersionLedger`] holding every content snapshot it has
//! ever had. The entity keeps these in lockstep:
//!
//! - `version()` equals the ledger's latest version number.
//! - `content()` equals the ledger's latest entry's content.
//! - The ledger is never empty: creation seeds it with version 1.
//!
//! Fields are private so the only way to change content is
//! [`Note::set_content`], which appends to the ledger. Structural fields
//! (parent link, sibling order) are owned by the store and only writable
//! from inside the crate.
//!
//! ## Titles
//!
//! A title given at creation is stored as-is, even when empty. Renaming to an
//! empty string stores the placeholder sentinel instead, so once a note has
//! been renamed it never carries an empty title.

use crate::ledger::{VersionEntry, VersionLedger};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Title stored when a note is renamed to an empty string.
pub const DEFAULT_PLACEHOLDER_TITLE: &str = "New idea...";

/// Opaque note identifier, supplied by an [`IdGenerator`](crate::ids::IdGenerator).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for compact display.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NoteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Outcome of the most recent persistence attempt. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    Saving,
    #[default]
    Saved,
    Error,
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SaveStatus::Saving => "saving",
            SaveStatus::Saved => "saved",
            SaveStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// One breadcrumb in a root-first hierarchy path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    pub id: NoteId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    id: NoteId,
    title: String,
    content: String,
    #[serde(default)]
    parent_id: Option<NoteId>,
    version: u64,
    versions: VersionLedger,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Position among siblings; lower sorts first.
    #[serde(default)]
    order: u64,
}

impl Note {
    /// Build a fresh note at version 1 with a single-entry ledger.
    pub fn new(
        id: NoteId,
        title: impl Into<String>,
        content: impl Into<String>,
        parent_id: Option<NoteId>,
        now: DateTime<Utc>,
    ) -> Self {
        let content = content.into();
        let mut versions = VersionLedger::new();
        let version = versions.append(content.clone(), now);
        Self {
            id,
            title: title.into(),
            content,
            parent_id,
            version,
            versions,
            created_at: now,
            updated_at: now,
            order: 0,
        }
    }

    pub fn id(&self) -> &NoteId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn parent_id(&self) -> Option<&NoteId> {
        self.parent_id.as_ref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn versions(&self) -> &[VersionEntry] {
        self.versions.entries()
    }

    pub fn ledger(&self) -> &VersionLedger {
        &self.versions
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn order(&self) -> u64 {
        self.order
    }

    /// Rename the note. An empty title is replaced by `placeholder`.
    pub fn rename(&mut self, title: impl Into<String>, placeholder: &str, now: DateTime<Utc>) {
        let title = title.into();
        self.title = if title.is_empty() {
            placeholder.to_string()
        } else {
            title
        };
        self.updated_at = now;
    }

    /// Record a new content snapshot. Every call produces a new version, even
    /// when the content is unchanged.
    pub fn set_content(&mut self, content: impl Into<String>, now: DateTime<Utc>) -> u64 {
        let content = content.into();
        self.version = self.versions.append(content.clone(), now);
        self.content = content;
        self.updated_at = now;
        self.version
    }

    pub(crate) fn set_parent(&mut self, parent_id: Option<NoteId>) {
        self.parent_id = parent_id;
    }

    pub(crate) fn set_order(&mut self, order: u64) {
        self.order = order;
    }

    /// Check the entity invariants for a note that came from storage.
    pub(crate) fn check_integrity(&self) -> Result<(), String> {
        let latest = self
            .versions
            .latest()
            .ok_or_else(|| format!("note {} has an empty version history", self.id))?;
        if latest.version != self.version {
            return Err(format!(
                "note {} is at version {} but its history ends at {}",
                self.id, self.version, latest.version
            ));
        }
        if latest.content != self.content {
            return Err(format!(
                "note {} content differs from its latest version",
                self.id
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn note(content: &str) -> Note {
        Note::new(NoteId::from("n1"), "A", content, None, t0())
    }

    #[test]
    fn new_note_starts_at_version_one() {
        let n = note("x");
        assert_eq!(n.version(), 1);
        assert_eq!(n.versions().len(), 1);
        assert_eq!(n.versions()[0].content, "x");
        assert_eq!(n.versions()[0].version, 1);
        assert_eq!(n.created_at(), n.updated_at());
        assert!(n.check_integrity().is_ok());
    }

    #[test]
    fn empty_title_is_kept_at_creation() {
        let n = Note::new(NoteId::from("n1"), "", "x", None, t0());
        assert_eq!(n.title(), "");
    }

    #[test]
    fn set_content_bumps_version_and_history() {
        let mut n = note("x");
        let later = t0() + Duration::seconds(5);
        assert_eq!(n.set_content("xy", later), 2);
        assert_eq!(n.content(), "xy");
        assert_eq!(n.updated_at(), later);
        assert_eq!(n.created_at(), t0());

        let history: Vec<_> = n
            .versions()
            .iter()
            .map(|v| (v.version, v.content.as_str()))
            .collect();
        assert_eq!(history, vec![(1, "x"), (2, "xy")]);
    }

    #[test]
    fn versions_len_tracks_version() {
        let mut n = note("x");
        for i in 0..10 {
            n.set_content(format!("rev {}", i), t0());
            assert_eq!(n.versions().len() as u64, n.version());
        }
        assert_eq!(n.version(), 11);
    }

    #[test]
    fn rename_to_empty_uses_placeholder() {
        let mut n = note("x");
        let later = t0() + Duration::minutes(1);
        n.rename("", DEFAULT_PLACEHOLDER_TITLE, later);
        assert_eq!(n.title(), DEFAULT_PLACEHOLDER_TITLE);
        assert_eq!(n.updated_at(), later);

        n.rename("Morning pages", DEFAULT_PLACEHOLDER_TITLE, later);
        assert_eq!(n.title(), "Morning pages");
    }

    #[test]
    fn rename_does_not_touch_history() {
        let mut n = note("x");
        n.rename("B", DEFAULT_PLACEHOLDER_TITLE, t0());
        assert_eq!(n.version(), 1);
        assert_eq!(n.versions().len(), 1);
    }

    #[test]
    fn integrity_check_catches_mismatched_content() {
        let mut n = note("x");
        n.content = "tampered".to_string();
        assert!(n.check_integrity().is_err());
    }

    #[test]
    fn short_id_truncates() {
        let id = NoteId::from("0123456789abcdef");
        assert_eq!(id.short(), "01234567");
        assert_eq!(NoteId::from("n1").short(), "n1");
    }

    #[test]
    fn save_status_defaults_to_saved() {
        assert_eq!(SaveStatus::default(), SaveStatus::Saved);
        assert_eq!(
            serde_json::to_string(&SaveStatus::Error).unwrap(),
            "\"error\""
        );
    }
}
