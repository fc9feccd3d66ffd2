/*
 * SPDX-FileCopyrightText: 2024 A3Mailer Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! Grandfather-Father-Son retention decisions
//!
//! Items are sorted into an age tier (daily, weekly, monthly, yearly or
//! expired). Daily items are always kept and expired items always deleted. In
//! the three bucketed tiers items are grouped by ISO week, calendar month or
//! calendar year respectively, and only the most recent item of each group
//! survives. Equal timestamps are settled by the smallest identity.
//!
//! Classification is a pure function of its inputs: the same items, config and
//! `now` always give the same plan, whatever order the items arrive in.

use crate::{age::ReferenceTime, config::RetentionConfig};
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

const SECONDS_PER_DAY: i64 = 86_400;

/// An item to classify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item<Id> {
    pub identity: Id,
    pub reference_time: ReferenceTime,
}

impl<Id> Item<Id> {
    pub fn new(identity: Id, reference_time: ReferenceTime) -> Self {
        Self {
            identity,
            reference_time,
        }
    }
}

/// Age tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Expired,
}

/// Calendar period an item is grouped by within a bucketed tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "period", rename_all = "lowercase")]
pub enum BucketKey {
    /// ISO week-year and week number
    Week { year: i32, week: u32 },
    Month { year: i32, month: u32 },
    Year { year: i32 },
}

/// Outcome for a single item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Keep,
    Delete,
}

/// Decision for one input item, with the reasoning behind it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification<Id> {
    pub identity: Id,
    pub reference_time: ReferenceTime,
    pub age_days: i64,
    pub tier: Tier,
    pub bucket: Option<BucketKey>,
    pub verdict: Verdict,
}

/// Result of classifying a set of items, ordered by identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPlan<Id> {
    entries: Vec<Classification<Id>>,
}

/// Whole days between `reference_time` and `now`, rounded down.
pub fn age_in_days(now: NaiveDateTime, reference_time: ReferenceTime) -> i64 {
    (now - reference_time)
        .num_seconds()
        .div_euclid(SECONDS_PER_DAY)
}

/// Tier for an item of the given age.
///
/// Boundaries are inclusive on the lower tier. Tiers are tested in order, so
/// an unordered config is applied as given rather than repaired.
pub fn tier_for(age_days: i64, config: &RetentionConfig) -> Tier {
    if age_days <= i64::from(config.max_age_daily) {
        Tier::Daily
    } else if age_days <= i64::from(config.max_age_weekly) {
        Tier::Weekly
    } else if age_days <= i64::from(config.max_age_monthly) {
        Tier::Monthly
    } else if age_days <= i64::from(config.max_age_yearly) {
        Tier::Yearly
    } else {
        Tier::Expired
    }
}

/// Bucket of `reference_time` within `tier`, if the tier is bucketed.
pub fn bucket_for(tier: Tier, reference_time: ReferenceTime) -> Option<BucketKey> {
    match tier {
        Tier::Weekly => {
            let week = reference_time.iso_week();
            Some(BucketKey::Week {
                year: week.year(),
                week: week.week(),
            })
        }
        Tier::Monthly => Some(BucketKey::Month {
            year: reference_time.year(),
            month: reference_time.month(),
        }),
        Tier::Yearly => Some(BucketKey::Year {
            year: reference_time.year(),
        }),
        Tier::Daily | Tier::Expired => None,
    }
}

/// Partition `items` into keep and delete.
///
/// Every input item appears exactly once in the returned plan.
pub fn classify<Id, I>(items: I, config: &RetentionConfig, now: NaiveDateTime) -> RetentionPlan<Id>
where
    Id: Ord + Clone,
    I: IntoIterator<Item = Item<Id>>,
{
    let mut entries: Vec<Classification<Id>> = items
        .into_iter()
        .map(|item| {
            let age_days = age_in_days(now, item.reference_time);
            let tier = tier_for(age_days, config);
            Classification {
                bucket: bucket_for(tier, item.reference_time),
                identity: item.identity,
                reference_time: item.reference_time,
                age_days,
                tier,
                verdict: match tier {
                    Tier::Daily => Verdict::Keep,
                    _ => Verdict::Delete,
                },
            }
        })
        .collect();

    // Best candidate per bucket, by index into `entries`.
    let mut survivors: BTreeMap<BucketKey, usize> = BTreeMap::new();
    for (idx, entry) in entries.iter().enumerate() {
        let Some(bucket) = entry.bucket else {
            continue;
        };
        survivors
            .entry(bucket)
            .and_modify(|best| {
                if supersedes(entry, &entries[*best]) {
                    *best = idx;
                }
            })
            .or_insert(idx);
    }

    for idx in survivors.into_values() {
        entries[idx].verdict = Verdict::Keep;
    }

    entries.sort_by(|a, b| {
        a.identity
            .cmp(&b.identity)
            .then(a.reference_time.cmp(&b.reference_time))
    });

    RetentionPlan { entries }
}

/// More recent wins; on a tie the smaller identity wins.
fn supersedes<Id: Ord>(candidate: &Classification<Id>, current: &Classification<Id>) -> bool {
    match candidate.reference_time.cmp(&current.reference_time) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Equal => candidate.identity < current.identity,
        std::cmp::Ordering::Less => false,
    }
}

impl<Id: Ord> RetentionPlan<Id> {
    pub fn entries(&self) -> &[Classification<Id>] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Classification<Id>> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keep(&self) -> impl Iterator<Item = &Classification<Id>> {
        self.entries
            .iter()
            .filter(|entry| entry.verdict == Verdict::Keep)
    }

    pub fn delete(&self) -> impl Iterator<Item = &Classification<Id>> {
        self.entries
            .iter()
            .filter(|entry| entry.verdict == Verdict::Delete)
    }

    /// Decision for `identity`, if it was part of the input.
    pub fn verdict(&self, identity: &Id) -> Option<Verdict> {
        self.entries
            .binary_search_by(|entry| entry.identity.cmp(identity))
            .ok()
            .map(|idx| self.entries[idx].verdict)
    }

    /// Number of kept items per tier.
    pub fn kept_by_tier(&self) -> BTreeMap<Tier, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.keep() {
            *counts.entry(entry.tier).or_insert(0) += 1;
        }
        counts
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Daily => "daily",
            Tier::Weekly => "weekly",
            Tier::Monthly => "monthly",
            Tier::Yearly => "yearly",
            Tier::Expired => "expired",
        })
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Week { year, week } => write!(f, "{year}-W{week:02}"),
            BucketKey::Month { year, month } => write!(f, "{year}-{month:02}"),
            BucketKey::Year { year } => write!(f, "{year}"),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Keep => "keep",
            Verdict::Delete => "delete",
        })
    }
}
