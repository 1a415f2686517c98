// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Documents folder when the platform has one, else the home directory.
pub fn default_export_dir() -> Result<PathBuf> {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join("solcalc"))
        .ok_or_else(|| anyhow!("cannot resolve a documents directory -- pass --export-dir and retry"))
}

/// Writes `contents` next to its final name and renames it into place.
pub fn write_export(dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf> {
    if file_name.is_empty() || file_name.contains(['/', '\\']) {
        bail!("export file name {file_name:?} must be a plain file name");
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("create export directory {}", dir.display()))?;

    let path = dir.join(file_name);
    let staging = dir.join(format!(".{file_name}.partial"));
    fs::write(&staging, contents)
        .with_context(|| format!("write export staging file {}", staging.display()))?;
    if let Err(error) = fs::rename(&staging, &path) {
        let _ = fs::remove_file(&staging);
        return Err(error).with_context(|| format!("move export into {}", path.display()));
    }

    info!(path = %path.display(), bytes = contents.len(), "wrote export");
    Ok(path)
}
