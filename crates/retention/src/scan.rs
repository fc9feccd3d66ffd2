/*
 * SPDX-FileCopyrightText: 2024 A3Mailer Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! Discovery of candidate backup items under a root directory

use crate::{
    config::RunOptions,
    error::{RetentionError, Result},
};
use chrono::{DateTime, Local, NaiveDateTime};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A candidate item found by the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedItem {
    pub path: PathBuf,
    /// Last modification time, local wall clock
    pub modified: NaiveDateTime,
    pub is_dir: bool,
}

impl ScannedItem {
    /// Final path component, or the whole path when there is none.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or(self.path.as_os_str())
            .to_string_lossy()
            .into_owned()
    }
}

/// Confirm the root exists, is a directory and can be listed.
pub fn validate_root(root: &Path) -> Result<()> {
    let invalid = |reason: String| RetentionError::InvalidPath {
        path: root.to_path_buf(),
        reason,
    };

    let metadata = std::fs::metadata(root).map_err(|e| invalid(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(invalid("not a directory".to_string()));
    }
    std::fs::read_dir(root).map_err(|e| invalid(format!("not readable: {}", e)))?;

    Ok(())
}

/// Enumerates regular files below a root
#[derive(Debug, Clone)]
pub struct Scanner {
    recursive: bool,
    follow_symlinks: bool,
}

impl Scanner {
    pub fn new(options: &RunOptions) -> Self {
        Self {
            recursive: options.recursive,
            follow_symlinks: options.follow_symlinks,
        }
    }

    /// List candidate items under `root`.
    ///
    /// Entries that cannot be read are logged and skipped. Links to files are
    /// always reported; linked directories are only descended into when
    /// symlinks are followed.
    pub fn scan(&self, root: &Path) -> Result<Vec<ScannedItem>> {
        validate_root(root)?;

        let mut walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name();
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        let mut items = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };

            let metadata = if entry.file_type().is_file() {
                entry.metadata().map_err(std::io::Error::from)
            } else if entry.path_is_symlink() {
                // Unfollowed links still count when they point at a file.
                match std::fs::metadata(entry.path()) {
                    Ok(metadata) if metadata.is_file() => Ok(metadata),
                    Ok(_) => continue,
                    Err(err) => {
                        warn!("Skipping dangling link {}: {}", entry.path().display(), err);
                        continue;
                    }
                }
            } else {
                continue;
            };

            let modified = match metadata.and_then(|metadata| metadata.modified()) {
                Ok(modified) => DateTime::<Local>::from(modified).naive_local(),
                Err(err) => {
                    warn!("Skipping {}: {}", entry.path().display(), err);
                    continue;
                }
            };

            debug!("Found {} (modified {})", entry.path().display(), modified);
            items.push(ScannedItem {
                path: entry.into_path(),
                modified,
                is_dir: false,
            });
        }

        Ok(items)
    }
}
