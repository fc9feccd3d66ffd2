/*
 * SPDX-FileCopyrightText: 2024 A3Mailer Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! Age resolution
//!
//! Maps a scanned item to the timestamp its age is measured from: either the
//! modification time reported by the scanner, or a date embedded in the file
//! name.

use crate::{
    error::{RetentionError, Result},
    scan::ScannedItem,
};
use chrono::{NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Timestamp an item's age is computed from, in local wall-clock time
pub type ReferenceTime = NaiveDateTime;

/// Where the reference time of an item comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeSource {
    /// Filesystem modification time
    #[default]
    Modified,
    /// Date embedded in the file name
    Filename,
}

/// A single recognized file name layout
#[derive(Debug, Clone)]
pub struct DatePattern {
    label: &'static str,
    regex: Regex,
    with_time: bool,
}

impl DatePattern {
    fn new(label: &'static str, body: &str, with_time: bool) -> Self {
        let regex = Regex::new(body)
            .unwrap_or_else(|err| panic!("invalid date pattern {label}: {err}"));

        Self {
            label,
            regex,
            with_time,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// First occurrence in `name` that forms a valid calendar date.
    ///
    /// Digits may not continue on either side of an occurrence.
    pub fn find(&self, name: &str) -> Option<NaiveDateTime> {
        let bytes = name.as_bytes();
        let mut start = 0;

        while let Some(caps) = self.regex.captures_at(name, start) {
            let found = caps.get(0)?;
            // Every pattern starts with an ASCII digit, so `+ 1` stays on a
            // char boundary.
            start = found.start() + 1;

            let bounded = (found.start() == 0 || !bytes[found.start() - 1].is_ascii_digit())
                && bytes.get(found.end()).map_or(true, |b| !b.is_ascii_digit());
            if !bounded {
                continue;
            }
            if let Some(datetime) = self.to_datetime(&caps) {
                return Some(datetime);
            }
        }

        None
    }

    fn to_datetime(&self, caps: &Captures<'_>) -> Option<NaiveDateTime> {
        let field = |idx: usize| caps.get(idx)?.as_str().parse::<u32>().ok();

        let date = NaiveDate::from_ymd_opt(field(1)? as i32, field(2)?, field(3)?)?;
        if self.with_time {
            date.and_hms_opt(field(4)?, field(5)?, 0)
        } else {
            date.and_hms_opt(0, 0, 0)
        }
    }
}

/// Ordered list of file name date patterns; the first match wins
#[derive(Debug, Clone)]
pub struct FilenameDateParser {
    patterns: Vec<DatePattern>,
}

impl FilenameDateParser {
    pub fn new() -> Self {
        Self {
            patterns: vec![
                DatePattern::new(
                    "YYYY-MM-DD_HH-MM",
                    r"(\d{4})-(\d{2})-(\d{2})_(\d{2})-(\d{2})",
                    true,
                ),
                DatePattern::new(
                    "YYYY_MM_DD_HH_MM",
                    r"(\d{4})_(\d{2})_(\d{2})_(\d{2})_(\d{2})",
                    true,
                ),
                DatePattern::new("YYYYMMDD_HHMM", r"(\d{4})(\d{2})(\d{2})_(\d{2})(\d{2})", true),
                DatePattern::new("YYYY-MM-DD", r"(\d{4})-(\d{2})-(\d{2})", false),
                DatePattern::new("YYYY_MM_DD", r"(\d{4})_(\d{2})_(\d{2})", false),
                DatePattern::new("YYYYMMDD", r"(\d{4})(\d{2})(\d{2})", false),
            ],
        }
    }

    pub fn patterns(&self) -> &[DatePattern] {
        &self.patterns
    }

    /// Extract a timestamp from a file name.
    pub fn parse(&self, name: &str) -> Option<NaiveDateTime> {
        self.patterns.iter().find_map(|pattern| {
            let found = pattern.find(name);
            if found.is_some() {
                trace!("{:?} matched pattern {}", name, pattern.label);
            }
            found
        })
    }
}

impl Default for FilenameDateParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves the reference time of scanned items
#[derive(Debug, Clone)]
pub struct AgeResolver {
    source: AgeSource,
    parser: FilenameDateParser,
}

impl AgeResolver {
    pub fn new(source: AgeSource) -> Self {
        Self {
            source,
            parser: FilenameDateParser::new(),
        }
    }

    pub fn source(&self) -> AgeSource {
        self.source
    }

    /// Resolve the reference time of `item`.
    ///
    /// `now` is only used to trace the resulting age.
    pub fn resolve(&self, item: &ScannedItem, now: NaiveDateTime) -> Result<ReferenceTime> {
        let reference_time = match self.source {
            AgeSource::Modified => item.modified,
            AgeSource::Filename => {
                let name = item.file_name();
                self.parser
                    .parse(&name)
                    .ok_or(RetentionError::AgeResolution { name })?
            }
        };

        trace!(
            "{} resolved to {} ({} days old)",
            item.path.display(),
            reference_time,
            crate::policy::age_in_days(now, reference_time)
        );

        Ok(reference_time)
    }
}

/// Resolve the reference time of a single item.
pub fn resolve_age(item: &ScannedItem, source: AgeSource, now: NaiveDateTime) -> Result<ReferenceTime> {
    AgeResolver::new(source).resolve(item, now)
}
