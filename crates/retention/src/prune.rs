/*
 * SPDX-FileCopyrightText: 2024 A3Mailer Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! Deletion of items a plan marked for removal, and empty folder cleanup

use crate::{error::RetentionError, scan::ScannedItem};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Applies deletions, or only reports them in dry-run mode
#[derive(Debug, Clone, Copy)]
pub struct Pruner {
    dry_run: bool,
}

/// A deletion that did not go through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Result of deleting planned items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneOutcome {
    pub dry_run: bool,
    /// Removed items, or the items a dry run would remove
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<PruneFailure>,
}

/// Result of removing folders left empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderCleanup {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PruneFailure>,
}

impl Pruner {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Delete every item in `targets`.
    ///
    /// A failed deletion is logged and recorded; the remaining items are still
    /// processed.
    pub async fn apply<'a, I>(&self, targets: I) -> PruneOutcome
    where
        I: IntoIterator<Item = &'a ScannedItem>,
    {
        let mut outcome = PruneOutcome {
            dry_run: self.dry_run,
            ..Default::default()
        };

        for item in targets {
            if self.dry_run {
                info!("Dry run - would delete: {}", item.path.display());
                outcome.deleted.push(item.path.clone());
                continue;
            }

            let result = if item.is_dir {
                tokio::fs::remove_dir_all(&item.path).await
            } else {
                tokio::fs::remove_file(&item.path).await
            };

            match result {
                Ok(()) => {
                    info!("Deleted: {}", item.path.display());
                    outcome.deleted.push(item.path.clone());
                }
                Err(source) => {
                    let err = RetentionError::Deletion {
                        path: item.path.clone(),
                        source,
                    };
                    error!("{}", err);
                    outcome.failed.push(PruneFailure {
                        path: item.path.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        outcome
    }

    /// Remove directories below `root` that are left empty.
    ///
    /// The root itself is never removed and symlinked directories are never
    /// descended into. A dry run reports the directories that would be empty
    /// once `deleted` is gone, which is what a real run removes.
    pub async fn clean_empty_folders(&self, root: &Path, deleted: &[PathBuf]) -> FolderCleanup {
        let mut cleanup = FolderCleanup::default();
        let mut gone: HashSet<PathBuf> = deleted.iter().cloned().collect();

        let walker = WalkDir::new(root)
            .min_depth(1)
            .contents_first(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry during cleanup: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            let dir = entry.path();
            match is_empty_dir(dir, &gone) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    warn!("Cannot list {}: {}", dir.display(), err);
                    continue;
                }
            }

            if self.dry_run {
                info!("Dry run - would remove empty directory: {}", dir.display());
                gone.insert(dir.to_path_buf());
                cleanup.removed.push(dir.to_path_buf());
                continue;
            }

            match tokio::fs::remove_dir(dir).await {
                Ok(()) => {
                    info!("Removed empty directory: {}", dir.display());
                    cleanup.removed.push(dir.to_path_buf());
                }
                Err(err) => {
                    error!("Error removing directory {}: {}", dir.display(), err);
                    cleanup.failed.push(PruneFailure {
                        path: dir.to_path_buf(),
                        error: err.to_string(),
                    });
                }
            }
        }

        cleanup
    }
}

/// True when every entry of `dir` is already accounted for in `gone`.
fn is_empty_dir(dir: &Path, gone: &HashSet<PathBuf>) -> std::io::Result<bool> {
    for child in std::fs::read_dir(dir)? {
        let child = child?.path();
        if !gone.contains(&child) {
            debug!("{} still holds {}", dir.display(), child.display());
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn file(path: PathBuf) -> ScannedItem {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, b"backup").unwrap();
        ScannedItem {
            path,
            modified: NaiveDate::from_ymd_opt(2020, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            is_dir: false,
        }
    }

    #[tokio::test]
    async fn test_dry_run_leaves_files() {
        let temp_dir = TempDir::new().unwrap();
        let items = vec![
            file(temp_dir.path().join("a.tar")),
            file(temp_dir.path().join("b.tar")),
        ];

        let outcome = Pruner::new(true).apply(&items).await;
        assert!(outcome.dry_run);
        assert_eq!(outcome.deleted.len(), 2);
        assert!(outcome.failed.is_empty());
        assert!(items.iter().all(|item| item.path.exists()));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_remaining_deletions() {
        let temp_dir = TempDir::new().unwrap();
        let present = file(temp_dir.path().join("present.tar"));
        let missing = ScannedItem {
            path: temp_dir.path().join("missing.tar"),
            ..present.clone()
        };

        let outcome = Pruner::new(false).apply([&missing, &present]).await;
        assert_eq!(outcome.deleted, vec![present.path.clone()]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].path, missing.path);
        assert!(!present.path.exists());
    }

    #[tokio::test]
    async fn test_directory_items_are_removed_with_contents() {
        let temp_dir = TempDir::new().unwrap();
        let inside = file(temp_dir.path().join("snapshot-2020/data.bin"));
        let snapshot = ScannedItem {
            path: temp_dir.path().join("snapshot-2020"),
            is_dir: true,
            ..inside.clone()
        };

        let outcome = Pruner::new(false).apply([&snapshot]).await;
        assert_eq!(outcome.deleted, vec![snapshot.path.clone()]);
        assert!(outcome.failed.is_empty());
        assert!(!snapshot.path.exists());
    }

    #[tokio::test]
    async fn test_clean_empty_folders() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let doomed = file(root.join("old/2019/a.tar"));
        let survivor = file(root.join("recent/b.tar"));
        fs::create_dir_all(root.join("already-empty")).unwrap();

        let deleted = vec![doomed.path.clone()];

        // Dry run predicts the folders the real run removes.
        let predicted = Pruner::new(true).clean_empty_folders(root, &deleted).await;
        let mut expected = vec![
            root.join("already-empty"),
            root.join("old/2019"),
            root.join("old"),
        ];
        expected.sort();
        let mut removed = predicted.removed.clone();
        removed.sort();
        assert_eq!(removed, expected);
        assert!(root.join("old/2019").exists());

        let pruner = Pruner::new(false);
        let outcome = pruner.apply([&doomed]).await;
        assert_eq!(outcome.deleted, deleted);

        let cleanup = pruner.clean_empty_folders(root, &outcome.deleted).await;
        let mut removed = cleanup.removed.clone();
        removed.sort();
        assert_eq!(removed, expected);
        assert!(cleanup.failed.is_empty());
        assert!(!root.join("old").exists());
        assert!(survivor.path.exists());
        assert!(root.exists());
    }
}
