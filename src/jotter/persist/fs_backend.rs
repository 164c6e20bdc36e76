use super::backend::StorageBackend;
use crate::error::{JotterError, Result};
use crate::store::Snapshot;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const DATA_FILENAME: &str = "notes.json";

/// Stores the whole snapshot as pretty-printed JSON in `<root>/notes.json`.
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_file(&self) -> PathBuf {
        self.root.join(DATA_FILENAME)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(JotterError::Io)?;
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn load(&self) -> Result<Option<Snapshot>> {
        let data_file = self.data_file();
        if !data_file.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&data_file).map_err(JotterError::Io)?;
        // Well-formed JSON that breaks a ledger or entity rule is corrupt data.
        let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
            if e.is_data() {
                JotterError::Corrupt(e.to_string())
            } else {
                JotterError::Serialization(e)
            }
        })?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        self.ensure_dir()?;

        let content = serde_json::to_string_pretty(snapshot).map_err(JotterError::Serialization)?;

        // Atomic write: never leave a half-written notes.json behind
        let tmp_file = self.root.join(format!(".notes-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_file, content).map_err(JotterError::Io)?;
        if let Err(e) = fs::rename(&tmp_file, self.data_file()) {
            let _ = fs::remove_file(&tmp_file);
            return Err(JotterError::Io(e));
        }
        Ok(())
    }

    fn location(&self) -> PathBuf {
        self.data_file()
    }
}
