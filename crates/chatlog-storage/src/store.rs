//! Log Store - One File per Log on the Local Filesystem
//!
//! `LogStore` maps each `LogIdentifier` to a file under the configured root
//! and moves logs between memory and disk through the binary format.
//!
//! ## Layout
//!
//! ```text
//! <root_dir>/
//!   dota2/
//!     2018-09.log           channel log
//!     2018-09.alice.log     user log of "alice"
//!     2018-10.log
//!   forsen/
//!     2018-09.log
//! ```
//!
//! Periods that are not a calendar month are written as `<begin>-<end>` in
//! milliseconds.
//!
//! ## Atomic Saves
//!
//! `save` encodes the log completely, writes it to a hidden temporary sibling,
//! syncs it and renames it over the final name. Readers see either the old
//! file or the new one, never a partial write. An encoding failure (for
//! example a capacity error) leaves the existing file untouched.
//!
//! ## Missing vs Broken Files
//!
//! `load` returns `Ok(None)` both when the file does not exist and when it
//! cannot be decoded; a broken file is reported with `tracing::warn!` and
//! treated as missing so callers regenerate it. Filesystem failures other
//! than "not found" are returned as errors.

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use chatlog_core::{Log, LogIdentifier};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::format::{LogReader, LogWriter};

/// Filesystem-backed collection of logs
#[derive(Debug, Clone)]
pub struct LogStore {
    config: StoreConfig,
    writer: LogWriter,
}

impl LogStore {
    pub fn new(config: StoreConfig) -> Self {
        let writer = LogWriter::new(config.format_mode);
        Self { config, writer }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// File path of the log named by `id`.
    ///
    /// Fails with `InvalidIdentifier` if the channel or user log name could
    /// escape its directory or collide with the temporary file names.
    pub fn path_for(&self, id: &LogIdentifier) -> Result<PathBuf> {
        check_component("channel name", id.channel_name())?;

        let mut file_name = id.period().to_string();
        if let Some(user) = id.user_log_name() {
            check_component("user log name", user)?;
            file_name.push('.');
            file_name.push_str(user);
        }
        file_name.push('.');
        file_name.push_str(&self.config.file_extension);

        Ok(self
            .config
            .root_dir
            .join(id.channel_name())
            .join(file_name))
    }

    /// Encode and store `log`, replacing any previous version
    pub fn save(&self, log: &Log) -> Result<PathBuf> {
        let path = self.path_for(log.id())?;
        let bytes = self.writer.encode(log)?;

        let dir = path
            .parent()
            .ok_or_else(|| Error::InvalidIdentifier(format!("{} has no parent directory", log.id())))?;
        fs::create_dir_all(dir)?;

        // Unique per call; removed on drop unless persisted
        let mut tmp = tempfile::Builder::new()
            .prefix(".")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        tracing::info!(
            log = %log.id(),
            path = %path.display(),
            lines = log.len(),
            bytes = bytes.len(),
            "Saved log"
        );

        Ok(path)
    }

    /// Load the log named by `id`, or None if it is missing or unreadable
    pub fn load(&self, id: &LogIdentifier) -> Result<Option<Log>> {
        let path = self.path_for(id)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let log = match LogReader::new().read(&mut BufReader::new(file)) {
            Ok(log) => log,
            Err(chatlog_core::Error::Io(e)) => return Err(e.into()),
            Err(e) => {
                tracing::warn!(
                    log = %id,
                    path = %path.display(),
                    error = %e,
                    "Unreadable log file, treating as missing"
                );
                return Ok(None);
            }
        };

        if log.id() != id {
            tracing::warn!(
                log = %id,
                found = %log.id(),
                path = %path.display(),
                "Log file holds a different log, treating as missing"
            );
            return Ok(None);
        }

        tracing::debug!(log = %id, lines = log.len(), "Loaded log");
        Ok(Some(log))
    }

    /// Whether a file exists for `id` (it may still be unreadable)
    pub fn contains(&self, id: &LogIdentifier) -> bool {
        self.path_for(id).map(|path| path.is_file()).unwrap_or(false)
    }

    /// Delete the file for `id`. Returns false if there was none.
    pub fn remove(&self, id: &LogIdentifier) -> Result<bool> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(log = %id, path = %path.display(), "Removed log");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn check_component(what: &str, value: &str) -> Result<()> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.starts_with('.')
        || value.contains(['/', '\\', '\0']);
    if invalid {
        return Err(Error::InvalidIdentifier(format!(
            "{} {:?} is not usable as a file name",
            what, value
        )));
    }
    Ok(())
}
