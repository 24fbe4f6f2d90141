// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Unpacking the supplied data archive into the data folder

use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::Result;

/// Archive entries produced by macOS Finder that carry no data
const MACOS_METADATA_DIR: &str = "__MACOSX";

/// Summary of an extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub skipped: usize,
    /// Top-level folders found in the data folder afterwards (batch dates)
    pub batches: Vec<String>,
}

/// Extract `archive` into `data_dir`, creating it if needed.
///
/// Entries whose names would escape `data_dir` are skipped.
pub fn extract_archive(archive: &Path, data_dir: &Path) -> Result<ExtractSummary> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)?;
    fs::create_dir_all(data_dir)?;

    let mut summary = ExtractSummary::default();
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;

        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe archive entry: {}", entry.name());
            summary.skipped += 1;
            continue;
        };
        if relative.starts_with(MACOS_METADATA_DIR) {
            summary.skipped += 1;
            continue;
        }

        let target = data_dir.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        std::io::copy(&mut entry, &mut out)?;
        debug!("Extracted {:?}", target);
        summary.files += 1;
    }

    summary.batches = list_batches(data_dir)?;
    info!("Extracted {} files from {:?} into {:?}", summary.files, archive, data_dir);
    Ok(summary)
}

/// Sub-folders of the data folder, sorted
pub fn list_batches(data_dir: &Path) -> Result<Vec<String>> {
    if !data_dir.exists() {
        return Ok(Vec::new());
    }
    let mut batches: Vec<String> = fs::read_dir(data_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name != MACOS_METADATA_DIR)
        .collect();
    batches.sort();
    Ok(batches)
}
