/*
 * SPDX-FileCopyrightText: 2024 A3Mailer Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! Counters collected over a retention run

use crate::{
    policy::{RetentionPlan, Tier},
    prune::{FolderCleanup, PruneOutcome},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Run statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_scanned: usize,
    /// Items whose age could not be resolved; neither kept nor deleted
    pub skipped: usize,
    pub kept: usize,
    pub deleted: usize,
    /// Planned deletions reported by a dry run
    pub would_delete: usize,
    pub errors: usize,
    pub folders_removed: usize,
    pub kept_by_tier: BTreeMap<Tier, usize>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of discovery and age resolution
    pub fn record_scan(&mut self, scanned: usize, skipped: usize) {
        self.total_scanned += scanned;
        self.skipped += skipped;
    }

    /// Record the classification of resolved items
    pub fn record_plan<Id: Ord>(&mut self, plan: &RetentionPlan<Id>) {
        self.kept += plan.keep().count();
        for (tier, count) in plan.kept_by_tier() {
            *self.kept_by_tier.entry(tier).or_insert(0) += count;
        }
    }

    /// Record what the deletion executor did
    pub fn record_prune(&mut self, outcome: &PruneOutcome) {
        if outcome.dry_run {
            self.would_delete += outcome.deleted.len();
        } else {
            self.deleted += outcome.deleted.len();
        }
        self.errors += outcome.failed.len();
    }

    /// Record empty folder cleanup
    pub fn record_cleanup(&mut self, cleanup: &FolderCleanup) {
        self.folders_removed += cleanup.removed.len();
        self.errors += cleanup.failed.len();
    }

    /// Items that took part in classification
    pub fn matched(&self) -> usize {
        self.total_scanned - self.skipped
    }
}
