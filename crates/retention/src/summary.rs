/*
 * SPDX-FileCopyrightText: 2024 A3Mailer Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! Plain-language description of a retention policy

use crate::config::RetentionConfig;

/// One line per tier describing what the policy keeps.
pub fn policy_summary(config: &RetentionConfig) -> Vec<String> {
    let RetentionConfig {
        max_age_daily: daily,
        max_age_weekly: weekly,
        max_age_monthly: monthly,
        max_age_yearly: yearly,
    } = *config;

    let mut summary = vec![
        format!("Daily backups preserved for the last {daily} days."),
        format!("Weekly backups preserved for files older than {daily} days and up to {weekly} days."),
        format!("Monthly backups preserved for files older than {weekly} days and up to {monthly} days."),
    ];

    if yearly > monthly {
        summary.push(format!(
            "Yearly backups preserved for files older than {monthly} days and up to {yearly} days."
        ));
    } else {
        summary.push(format!("No yearly backups are preserved beyond {monthly} days."));
    }

    summary.push(format!("Files older than {yearly} days are not preserved."));
    summary
}
