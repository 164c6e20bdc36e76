use crate::error::Result;
use crate::store::Snapshot;
use std::path::PathBuf;

/// Abstract interface for raw snapshot I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while [`Persister`](super::Persister) handles save-status reporting and
/// `NoteStore` handles everything about the notes themselves.
pub trait StorageBackend: Send + Sync {
    /// Load the last saved snapshot.
    /// Returns Ok(None) when nothing has been saved yet.
    fn load(&self) -> Result<Option<Snapshot>>;

    /// Save a snapshot.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn save(&self, snapshot: &Snapshot) -> Result<()>;

    /// Where the data lives. For FsBackend, this is the real path.
    /// For MemBackend, a virtual path.
    fn location(&self) -> PathBuf;
}
