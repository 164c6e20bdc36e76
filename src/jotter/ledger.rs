//! # Version Ledger
//!
//! Every note carries the full history of its content as an append-only list
//! of snapshots. The ledger is plain data: it can be appended to and read, and
//! nothing else. Entries are never reordered, rewritten or evicted.
//!
//! Version numbers start at 1 and grow by exactly one per entry, so for any
//! ledger `entries()[i].version == i + 1`. Deserialization goes through
//! [`VersionLedger::from_entries`] so a hand-edited or truncated file cannot
//! smuggle in a ledger that breaks this numbering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One historical snapshot of a note's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub version: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<VersionEntry>", into = "Vec<VersionEntry>")]
pub struct VersionLedger {
    entries: Vec<VersionEntry>,
}

impl VersionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from stored entries, checking the numbering.
    pub fn from_entries(entries: Vec<VersionEntry>) -> Result<Self, String> {
        for (idx, entry) in entries.iter().enumerate() {
            let expected = idx as u64 + 1;
            if entry.version != expected {
                return Err(format!(
                    "ledger entry {} has version {}, expected {}",
                    idx, entry.version, expected
                ));
            }
        }
        Ok(Self { entries })
    }

    /// Append a snapshot and return the version number assigned to it.
    pub fn append(&mut self, content: impl Into<String>, timestamp: DateTime<Utc>) -> u64 {
        let version = self.latest_version() + 1;
        self.entries.push(VersionEntry {
            content: content.into(),
            timestamp,
            version,
        });
        version
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[VersionEntry] {
        &self.entries
    }

    pub fn get(&self, version: u64) -> Option<&VersionEntry> {
        let idx = usize::try_from(version).ok()?.checked_sub(1)?;
        self.entries.get(idx)
    }

    pub fn latest(&self) -> Option<&VersionEntry> {
        self.entries.last()
    }

    /// Highest version recorded, or 0 for an empty ledger.
    pub fn latest_version(&self) -> u64 {
        self.entries.last().map(|e| e.version).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<Vec<VersionEntry>> for VersionLedger {
    type Error = String;

    fn try_from(entries: Vec<VersionEntry>) -> Result<Self, Self::Error> {
        Self::from_entries(entries)
    }
}

impl From<VersionLedger> for Vec<VersionEntry> {
    fn from(ledger: VersionLedger) -> Self {
        ledger.entries
    }
}
