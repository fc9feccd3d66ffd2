/*
 * SPDX-FileCopyrightText: 2024 A3Mailer Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! Console rendering of a finished run

use std::fmt::Write;

use console::style;
use prettytable::{Attr, Cell, Row, Table};
use retention::{RetentionConfig, RunReport, Tier};

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}", style(title).bold());
    let _ = writeln!(out, "{}", "─".repeat(title.chars().count()));
}

fn tier_window(tier: Tier, config: &RetentionConfig) -> String {
    match tier {
        Tier::Daily => format!("0 - {} days", config.max_age_daily),
        Tier::Weekly => format!("{} - {} days", config.max_age_daily, config.max_age_weekly),
        Tier::Monthly => format!("{} - {} days", config.max_age_weekly, config.max_age_monthly),
        Tier::Yearly => format!("{} - {} days", config.max_age_monthly, config.max_age_yearly),
        Tier::Expired => format!("> {} days", config.max_age_yearly),
    }
}

fn tier_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Tier").with_style(Attr::Bold),
        Cell::new("Age").with_style(Attr::Bold),
        Cell::new("Kept").with_style(Attr::Bold),
    ]));

    for tier in [Tier::Daily, Tier::Weekly, Tier::Monthly, Tier::Yearly] {
        let kept = report.stats.kept_by_tier.get(&tier).copied().unwrap_or(0);
        table.add_row(Row::new(vec![
            Cell::new(&tier.to_string()),
            Cell::new(&tier_window(tier, &report.retention)),
            Cell::new(&kept.to_string()),
        ]));
    }

    table
}

/// Human-readable report.
pub fn render_text(report: &RunReport) -> String {
    let stats = &report.stats;
    let options = &report.options;
    let mut out = String::new();

    let _ = writeln!(out, "Total files scanned: {}", stats.total_scanned);
    let _ = writeln!(out, "Matched files: {}", stats.matched());
    if options.dry_run {
        let _ = writeln!(
            out,
            "Potential files to delete: {} (Dry run - no files were actually deleted)",
            stats.would_delete
        );
    } else {
        let _ = writeln!(out, "Deleted files: {}", stats.deleted);
    }
    if stats.skipped > 0 {
        let _ = writeln!(out, "Skipped (no date in file name): {}", stats.skipped);
    }
    if options.clean_folders && options.recursive {
        let label = if options.dry_run {
            "Empty folders that would be removed"
        } else {
            "Empty folders removed"
        };
        let _ = writeln!(out, "{}: {}", label, stats.folders_removed);
    }
    if stats.errors > 0 {
        let _ = writeln!(out, "{}", style(format!("Errors encountered: {}", stats.errors)).red());
        for failure in report.failed.iter().chain(&report.folders.failed) {
            let _ = writeln!(out, "  {}", failure.error);
        }
    }

    heading(&mut out, "Kept backups:");
    let _ = write!(out, "{}", tier_table(report));

    heading(&mut out, "Options used:");
    for (label, value) in [
        ("Dry run", options.dry_run),
        ("Use filename for date", options.use_filename),
        ("Recursive", options.recursive),
        ("Clean empty folders", options.clean_folders),
        ("Follow symbolic links", options.follow_symlinks),
    ] {
        let _ = writeln!(out, "- {}: {}", label, yes_no(value));
    }

    heading(&mut out, "Defined backup policy:");
    for line in &report.policy {
        let _ = writeln!(out, "{}", line);
    }

    out
}

/// Machine-readable report.
pub fn render_json(report: &RunReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use retention::{
        summary::policy_summary, FolderCleanup, PruneFailure, RunOptions, RunStats,
    };
    use std::{collections::BTreeMap, path::PathBuf};

    fn report(dry_run: bool) -> RunReport {
        let retention = RetentionConfig::default();
        RunReport {
            root: PathBuf::from("/backups"),
            options: RunOptions {
                dry_run,
                ..Default::default()
            },
            retention,
            stats: RunStats {
                total_scanned: 5,
                skipped: 1,
                kept: 2,
                deleted: if dry_run { 0 } else { 1 },
                would_delete: if dry_run { 2 } else { 0 },
                errors: if dry_run { 0 } else { 1 },
                folders_removed: 0,
                kept_by_tier: BTreeMap::from([(Tier::Daily, 2)]),
            },
            deleted: vec![PathBuf::from("/backups/old.tar")],
            failed: if dry_run {
                vec![]
            } else {
                vec![PruneFailure {
                    path: PathBuf::from("/backups/locked.tar"),
                    error: "Error deleting /backups/locked.tar: denied".to_string(),
                }]
            },
            skipped: vec![PathBuf::from("/backups/notes.txt")],
            folders: FolderCleanup::default(),
            policy: policy_summary(&retention),
        }
    }

    #[test]
    fn test_dry_run_text() {
        let text = render_text(&report(true));
        assert!(text.contains("Total files scanned: 5"));
        assert!(text.contains("Matched files: 4"));
        assert!(text.contains("Potential files to delete: 2 (Dry run"));
        assert!(text.contains("Skipped (no date in file name): 1"));
        assert!(text.contains("- Dry run: Yes"));
        assert!(text.contains("- Recursive: No"));
        assert!(text.contains("No yearly backups are preserved beyond 1095 days."));
        assert!(!text.contains("Errors encountered"));
    }

    #[test]
    fn test_errors_are_listed() {
        let text = render_text(&report(false));
        assert!(text.contains("Deleted files: 1"));
        assert!(text.contains("Errors encountered: 1"));
        assert!(text.contains("locked.tar: denied"));
    }

    #[test]
    fn test_json() {
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&report(true)).unwrap()).unwrap();
        assert_eq!(json["stats"]["would_delete"], 2);
        assert_eq!(json["stats"]["kept_by_tier"]["daily"], 2);
        assert_eq!(json["options"]["dry_run"], true);
    }
}
