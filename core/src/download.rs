//! The local save step of an export.
//!
//! A payload is staged into a temporary file (the transient reference), the
//! save action runs once against it, and the staged file is released
//! whatever the save action did.

use slidesynth_common::BinaryPayload;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::SaveError;

/// Where a finished export ends up.
pub trait SaveAction: Send + Sync {
    /// Persist the staged payload under `filename`, returning where it landed.
    fn save(&self, staged: &Path, filename: &str) -> Result<PathBuf, SaveError>;
}

/// Copies exports into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySave {
    dir: PathBuf,
}

impl DirectorySave {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveAction for DirectorySave {
    fn save(&self, staged: &Path, filename: &str) -> Result<PathBuf, SaveError> {
        let name = checked_filename(filename)?;
        let write_err = |source| SaveError::Write {
            filename: name.to_string(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(write_err)?;
        let dest = self.dir.join(name);
        std::fs::copy(staged, &dest).map_err(write_err)?;
        Ok(dest)
    }
}

/// A bare file name; anything carrying path components is refused.
pub fn checked_filename(filename: &str) -> Result<&str, SaveError> {
    let name = filename.trim();
    let bare = Path::new(name).file_name().and_then(|n| n.to_str());
    match bare {
        Some(bare) if bare == name => Ok(name),
        _ => Err(SaveError::InvalidFilename {
            filename: filename.to_string(),
        }),
    }
}

/// Payload written to a temporary file for the duration of one save.
pub struct StagedBlob {
    file: tempfile::NamedTempFile,
}

impl StagedBlob {
    pub fn stage(payload: &BinaryPayload) -> Result<Self, SaveError> {
        let mut file = tempfile::Builder::new()
            .prefix("slidesynth-")
            .suffix(".blob")
            .tempfile()
            .map_err(|source| SaveError::Stage { source })?;
        file.write_all(payload.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| SaveError::Stage { source })?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the staged file. Dropping does the same, silently.
    pub fn release(self) -> Result<(), SaveError> {
        self.file
            .close()
            .map_err(|source| SaveError::Release { source })
    }
}

/// Stage `payload`, hand it to `action` exactly once, then release it.
pub fn trigger_save(
    payload: &BinaryPayload,
    filename: &str,
    action: &dyn SaveAction,
) -> Result<PathBuf, SaveError> {
    let staged = StagedBlob::stage(payload)?;
    let saved = action.save(staged.path(), filename);
    if let Err(err) = staged.release() {
        tracing::warn!("{err}");
    }
    let path = saved?;
    tracing::info!("saved {} ({} bytes)", path.display(), payload.len());
    Ok(path)
}
