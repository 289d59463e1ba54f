//! Store Configuration
//!
//! This module defines configuration for the on-disk log store.
//!
//! ## StoreConfig
//!
//! Controls where logs live and how they are encoded:
//!
//! - **root_dir**: Directory holding one subdirectory per channel (default: `logs`)
//! - **format_mode**: Field width tag used when saving (default: 2, 32-bit fields)
//! - **file_extension**: Extension of log files (default: `log`)
//!
//! Loading accepts files of every format mode regardless of `format_mode`.
//!
//! ## Usage
//!
//! ```ignore
//! use chatlog_storage::StoreConfig;
//!
//! // From a TOML file
//! let config = StoreConfig::load("chatlog.toml")?;
//!
//! // In code
//! let config = StoreConfig {
//!     format_mode: FormatMode::Bits64,
//!     ..StoreConfig::new("/var/lib/chatlog")
//! };
//! ```
//!
//! ## TOML Layout
//!
//! ```toml
//! root_dir = "/var/lib/chatlog"
//! format_mode = 2
//! file_extension = "log"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::format::FormatMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the channel subdirectories
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Format mode used when saving (default: 32-bit)
    #[serde(default)]
    pub format_mode: FormatMode,

    /// Log file extension, without the dot
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            format_mode: FormatMode::default(),
            file_extension: default_file_extension(),
        }
    }
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_file_extension() -> String {
    "log".to_string()
}

impl StoreConfig {
    /// Default settings rooted at `root_dir`
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Default::default()
        }
    }

    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: StoreConfig =
            toml::from_str(s).map_err(|e| Error::Config(format!("invalid store config: {}", e)))?;
        config.check()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("cannot serialize store config: {}", e)))
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Save to a TOML file, creating the parent directory if needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    fn check(&self) -> Result<()> {
        let ext = &self.file_extension;
        if ext.is_empty() || ext.contains(['/', '\\', '.', '\0']) {
            return Err(Error::Config(format!("invalid file extension {:?}", ext)));
        }
        Ok(())
    }
}
