//! # Configuration
//!
//! Jotter configuration is loaded with [`confique`], layered in priority order:
//! 1. **Environment variables**: `JOTTER_AUTOSAVE_MS`, `JOTTER_FLUSH_ON_CLOSE`.
//! 2. **Data directory config**: `<data dir>/jotter.toml`, if present.
//! 3. **Compiled defaults**: via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `autosave_quiet_ms` | `2000` | Quiet period before a pending edit is committed |
//! | `flush_on_close` | `false` | Commit the pending edit when autosave shuts down |
//! | `placeholder_title` | `"New idea..."` | Title given to notes renamed to an empty title |

use crate::autosave::AutosaveConfig;
use crate::error::Result;
use crate::model::DEFAULT_PLACEHOLDER_TITLE;
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "jotter.toml";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct JotterConfig {
    /// Milliseconds without edits before autosave commits.
    #[config(default = 2000, env = "JOTTER_AUTOSAVE_MS")]
    pub autosave_quiet_ms: u64,

    /// Commit a pending edit on shutdown instead of dropping it.
    #[config(default = false, env = "JOTTER_FLUSH_ON_CLOSE")]
    pub flush_on_close: bool,

    #[config(default = "New idea...")]
    pub placeholder_title: String,
}

impl Default for JotterConfig {
    fn default() -> Self {
        Self {
            autosave_quiet_ms: 2000,
            flush_on_close: false,
            placeholder_title: DEFAULT_PLACEHOLDER_TITLE.to_string(),
        }
    }
}

impl JotterConfig {
    /// Load from the environment and `jotter.toml` in `data_dir`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config = Self::builder()
            .env()
            .file(data_dir.join(CONFIG_FILENAME))
            .load()?;
        Ok(config)
    }

    pub fn autosave(&self) -> AutosaveConfig {
        AutosaveConfig {
            quiet_period: Duration::from_millis(self.autosave_quiet_ms),
            flush_on_close: self.flush_on_close,
        }
    }
}
