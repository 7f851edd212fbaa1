// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project metadata serialization and deserialization.
//!
//! Sidecars are JSON. Files are written to a temporary file in the target
//! directory and renamed into place, so readers never see a partial file.

use crate::error::{Result, StereoError};
use crate::models::project::{ProjectMetadata, FILE_VERSION};
use std::fs::File;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write a file through `write`, making it visible at `path` only once
/// `write` has succeeded.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    write(temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| StereoError::Io(e.error))?;
    Ok(())
}

/// Export project metadata to JSON format.
pub fn export_json(data: &ProjectMetadata, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    write_atomically(path, |file| {
        std::io::Write::write_all(file, json.as_bytes())?;
        Ok(())
    })
}

/// Import project metadata from JSON format, rejecting unknown versions.
pub fn import_json(path: &Path) -> Result<ProjectMetadata> {
    let json = std::fs::read_to_string(path)?;
    let data: ProjectMetadata = serde_json::from_str(&json)?;
    if data.file_version != FILE_VERSION {
        return Err(StereoError::UnsupportedVersion(data.file_version));
    }
    Ok(data)
}
