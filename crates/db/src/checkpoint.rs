//! Durable high-water-mark store.
//!
//! A single ISO-8601 timestamp with timezone, held in a local file. A
//! missing or malformed file is treated as the minimum UTC timestamp
//! rather than an error: replaying from the beginning is always safe
//! because loader upserts are idempotent.

use crate::error::CheckpointError;
use filmsync_core::model::{Checkpoint, MIN_CHECKPOINT};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct CheckpointStore {
  path: PathBuf,
}

impl CheckpointStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// Read the stored checkpoint. Never fails: absent or malformed content
  /// both fall back to [`MIN_CHECKPOINT`].
  pub fn load(&self) -> Checkpoint {
    let raw = match std::fs::read_to_string(&self.path) {
      Ok(raw) => raw,
      Err(_) => return MIN_CHECKPOINT,
    };
    match chrono::DateTime::parse_from_rfc3339(raw.trim()) {
      Ok(dt) => dt.with_timezone(&chrono::Utc),
      Err(_) => MIN_CHECKPOINT,
    }
  }

  /// Atomically replace the stored checkpoint with `value`.
  ///
  /// Writes to a sibling temp file and renames it over the target so a
  /// crash mid-write never leaves a truncated checkpoint behind.
  pub fn save(&self, value: Checkpoint) -> Result<(), CheckpointError> {
    let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|source| CheckpointError::Write {
      path: self.path.display().to_string(),
      source,
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|source| CheckpointError::Write {
      path: self.path.display().to_string(),
      source,
    })?;
    tmp.write_all(value.to_rfc3339().as_bytes()).map_err(|source| CheckpointError::Write {
      path: self.path.display().to_string(),
      source,
    })?;
    tmp.flush().map_err(|source| CheckpointError::Write {
      path: self.path.display().to_string(),
      source,
    })?;
    tmp.persist(&self.path).map_err(|e| CheckpointError::Write {
      path: self.path.display().to_string(),
      source: e.error,
    })?;
    Ok(())
  }
}
