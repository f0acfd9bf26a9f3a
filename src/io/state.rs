//! Read/write persisted state JSON files.
//!
//! Writes go to a sibling temporary file which is then renamed over the target,
//! so a reader never observes a half-written file. Callers that must replace
//! several files together stage all of them first and commit only once every
//! write has succeeded. Floats are written with shortest round-trip
//! formatting and parsed with `float_roundtrip`, so a reloaded state is
//! bit-identical to the one that was saved.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, TaxError};

/// A fully written temporary file waiting to be renamed over its target.
///
/// Dropping it without calling [`StagedFile::commit`] removes the temp file
/// and leaves the target untouched.
#[derive(Debug)]
#[must_use = "a staged file is discarded unless committed"]
pub struct StagedFile {
    tmp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Move the staged file into place.
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.tmp, &self.target).map_err(|e| {
            TaxError::persistence(&self.target, format!("failed to move temp file into place: {e}"))
        })?;
        self.committed = true;
        tracing::debug!(path = %self.target.display(), "wrote state file");
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

/// Serialize `value` into a temp file next to `path`, creating parent
/// directories. `path` itself is untouched until [`StagedFile::commit`].
pub fn stage_json<T: Serialize>(path: &Path, value: &T) -> Result<StagedFile> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| TaxError::persistence(path, format!("failed to create directory: {e}")))?;
    }

    let tmp = temp_path(path);
    let write = || -> std::result::Result<(), String> {
        let file = File::create(&tmp).map_err(|e| format!("failed to create temp file: {e}"))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value).map_err(|e| format!("failed to serialize: {e}"))?;
        writer.flush().map_err(|e| format!("failed to flush: {e}"))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| format!("failed to sync: {e}"))?;
        Ok(())
    };

    if let Err(message) = write() {
        let _ = fs::remove_file(&tmp);
        return Err(TaxError::persistence(path, message));
    }

    Ok(StagedFile {
        tmp,
        target: path.to_path_buf(),
        committed: false,
    })
}

/// Deserialize a JSON state file. Missing or corrupt files are persistence errors.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| TaxError::persistence(path, format!("failed to open: {e}")))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| TaxError::persistence(path, format!("invalid state JSON: {e}")))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "state".into());
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}
