/*
 * SPDX-FileCopyrightText: 2024 A3Mailer Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! # Backup Retention
//!
//! Grandfather-Father-Son pruning of backup directories:
//!
//! - Age resolution from modification time or from dates in file names
//! - Daily, weekly, monthly and yearly retention tiers
//! - Deterministic keep/delete plans that can be reviewed before applying
//! - Dry-run deletion and empty folder cleanup

pub mod age;
pub mod config;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod prune;
pub mod scan;
pub mod summary;

pub use age::{resolve_age, AgeResolver, AgeSource, FilenameDateParser, ReferenceTime};
pub use config::{RetentionConfig, RunOptions, Settings};
pub use error::{RetentionError, Result};
pub use metrics::RunStats;
pub use policy::{classify, BucketKey, Classification, Item, RetentionPlan, Tier, Verdict};
pub use prune::{FolderCleanup, PruneFailure, PruneOutcome, Pruner};
pub use scan::{validate_root, ScannedItem, Scanner};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info, warn};

/// Scans, classifies and prunes a backup directory
#[derive(Debug, Clone)]
pub struct RetentionService {
    inner: Arc<RetentionServiceInner>,
}

#[derive(Debug)]
struct RetentionServiceInner {
    settings: Settings,
    scanner: Scanner,
    resolver: AgeResolver,
    pruner: Pruner,
}

/// A classified directory, not yet applied
#[derive(Debug, Clone)]
pub struct PlannedRun {
    pub root: PathBuf,
    pub now: NaiveDateTime,
    pub total_scanned: usize,
    /// Items whose age could not be resolved
    pub skipped: Vec<PathBuf>,
    pub plan: RetentionPlan<PathBuf>,
    items: BTreeMap<PathBuf, ScannedItem>,
}

/// Everything a caller needs to report on a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub root: PathBuf,
    pub options: RunOptions,
    pub retention: RetentionConfig,
    pub stats: RunStats,
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<PruneFailure>,
    pub skipped: Vec<PathBuf>,
    pub folders: FolderCleanup,
    pub policy: Vec<String>,
}

impl RetentionService {
    /// Create a service, refusing settings that fail validation.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::new_unchecked(settings))
    }

    /// Create a service without validating tier order.
    ///
    /// Unordered tiers are then applied as given; see [`policy::tier_for`].
    pub fn new_unchecked(settings: Settings) -> Self {
        let source = if settings.options.use_filename {
            AgeSource::Filename
        } else {
            AgeSource::Modified
        };

        Self {
            inner: Arc::new(RetentionServiceInner {
                scanner: Scanner::new(&settings.options),
                resolver: AgeResolver::new(source),
                pruner: Pruner::new(settings.options.dry_run),
                settings,
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Scan `root`, resolve ages and classify everything found.
    ///
    /// Nothing on disk is modified.
    pub async fn plan(&self, root: &Path, now: NaiveDateTime) -> Result<PlannedRun> {
        info!("Scanning {}", root.display());
        let scanned = self.inner.scanner.scan(root)?;
        let total_scanned = scanned.len();

        let mut skipped = Vec::new();
        let mut items = BTreeMap::new();
        let mut candidates = Vec::with_capacity(scanned.len());
        for item in scanned {
            match self.inner.resolver.resolve(&item, now) {
                Ok(reference_time) => {
                    candidates.push(Item::new(item.path.clone(), reference_time));
                    items.insert(item.path.clone(), item);
                }
                Err(err) => {
                    warn!("Skipping {}: {}", item.path.display(), err);
                    skipped.push(item.path);
                }
            }
        }

        let plan = classify(candidates, &self.inner.settings.retention, now);
        for entry in plan.entries() {
            debug!(
                "{}: {} ({} days, {} tier{})",
                entry.identity.display(),
                entry.verdict,
                entry.age_days,
                entry.tier,
                entry
                    .bucket
                    .map(|bucket| format!(", bucket {bucket}"))
                    .unwrap_or_default()
            );
        }

        info!(
            "Classified {} items: {} to keep, {} to delete, {} skipped",
            plan.len(),
            plan.keep().count(),
            plan.delete().count(),
            skipped.len()
        );

        Ok(PlannedRun {
            root: root.to_path_buf(),
            now,
            total_scanned,
            skipped,
            plan,
            items,
        })
    }

    /// Delete what `planned` marks for deletion and clean up folders.
    pub async fn apply(&self, planned: &PlannedRun) -> RunReport {
        let options = self.inner.settings.options;
        let pruner = self.inner.pruner;

        let outcome = pruner.apply(planned.to_delete()).await;

        let folders = if options.clean_folders && options.recursive {
            pruner
                .clean_empty_folders(&planned.root, &outcome.deleted)
                .await
        } else {
            FolderCleanup::default()
        };

        let mut stats = RunStats::new();
        stats.record_scan(planned.total_scanned, planned.skipped.len());
        stats.record_plan(&planned.plan);
        stats.record_prune(&outcome);
        stats.record_cleanup(&folders);

        info!(
            "Run finished: {} scanned, {} kept, {} {}, {} errors",
            stats.total_scanned,
            stats.kept,
            outcome.deleted.len(),
            if outcome.dry_run { "would be deleted" } else { "deleted" },
            stats.errors
        );

        RunReport {
            root: planned.root.clone(),
            options,
            retention: self.inner.settings.retention,
            stats,
            deleted: outcome.deleted,
            failed: outcome.failed,
            skipped: planned.skipped.clone(),
            folders,
            policy: summary::policy_summary(&self.inner.settings.retention),
        }
    }

    /// Plan and apply in one go, without any confirmation step.
    pub async fn run(&self, root: &Path, now: NaiveDateTime) -> Result<RunReport> {
        let planned = self.plan(root, now).await?;
        Ok(self.apply(&planned).await)
    }
}

impl PlannedRun {
    /// Scanned items the plan marks for deletion, ordered by path.
    pub fn to_delete(&self) -> impl Iterator<Item = &ScannedItem> {
        self.plan
            .delete()
            .filter_map(|entry| self.items.get(&entry.identity))
    }

    pub fn delete_count(&self) -> usize {
        self.plan.delete().count()
    }
}

impl RunReport {
    /// True when at least one deletion or folder removal failed.
    pub fn has_errors(&self) -> bool {
        self.stats.errors > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration, Local, TimeZone};
    use std::fs::{self, File};
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn backdate(path: &Path, days: u64) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let file = File::create(path).unwrap();
        let modified = SystemTime::now() - std::time::Duration::from_secs(days * 86_400 + 43_200);
        file.set_modified(modified).unwrap();
    }

    fn touch_at(path: &Path, modified: NaiveDateTime) {
        let file = File::create(path).unwrap();
        let modified = Local.from_local_datetime(&modified).single().unwrap();
        file.set_modified(SystemTime::from(modified)).unwrap();
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    #[tokio::test]
    async fn test_service_rejects_unordered_tiers() {
        let settings = Settings {
            retention: RetentionConfig::new(400, 365, 1095, 1095),
            ..Default::default()
        };
        assert!(matches!(
            RetentionService::new(settings),
            Err(RetentionError::TierOrder { .. })
        ));
    }

    #[tokio::test]
    async fn test_plan_does_not_touch_disk() {
        let temp_dir = TempDir::new().unwrap();
        backdate(&temp_dir.path().join("fresh.tar"), 1);
        backdate(&temp_dir.path().join("ancient.tar"), 2000);

        let service = RetentionService::new(Settings::default()).unwrap();
        let planned = service.plan(temp_dir.path(), now()).await.unwrap();

        assert_eq!(planned.total_scanned, 2);
        assert_eq!(planned.delete_count(), 1);
        assert_eq!(
            planned.plan.verdict(&temp_dir.path().join("ancient.tar")),
            Some(Verdict::Delete)
        );
        assert!(temp_dir.path().join("ancient.tar").exists());
    }

    #[tokio::test]
    async fn test_run_deletes_expired_and_same_week_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        backdate(&root.join("fresh.tar"), 2);
        backdate(&root.join("ancient.tar"), 1500);

        // Monday and Tuesday noon of one ISO week, inside the weekly tier.
        let today = Local::now().date_naive();
        let monday = today
            - Duration::days(i64::from(today.weekday().num_days_from_monday()) + 7 * 10);
        let noon = monday.and_hms_opt(12, 0, 0).unwrap();
        touch_at(&root.join("monday.tar"), noon);
        touch_at(&root.join("tuesday.tar"), noon + Duration::days(1));

        let service = RetentionService::new(Settings::default()).unwrap();
        let report = service.run(root, now()).await.unwrap();

        assert_eq!(
            report.deleted,
            vec![root.join("ancient.tar"), root.join("monday.tar")]
        );
        assert_eq!(report.stats.deleted, 2);
        assert_eq!(report.stats.kept, 2);
        assert!(!report.has_errors());
        assert!(root.join("fresh.tar").exists());
        assert!(root.join("tuesday.tar").exists());
        assert!(!root.join("ancient.tar").exists());
        assert!(!root.join("monday.tar").exists());
    }

    #[tokio::test]
    async fn test_unresolvable_names_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let today = Local::now().date_naive();
        let stale = today - Duration::days(2000);
        backdate(&root.join(format!("db_{}.tar", stale.format("%Y-%m-%d"))), 0);
        backdate(&root.join("notes.txt"), 5000);

        let settings = Settings {
            options: RunOptions {
                use_filename: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let report = RetentionService::new(settings)
            .unwrap()
            .run(root, now())
            .await
            .unwrap();

        assert_eq!(report.skipped, vec![root.join("notes.txt")]);
        assert_eq!(report.stats.skipped, 1);
        assert_eq!(report.stats.matched(), 1);
        assert_eq!(report.deleted.len(), 1);
        assert!(root.join("notes.txt").exists());
    }
}
