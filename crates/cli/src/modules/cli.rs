/*
 * SPDX-FileCopyrightText: 2024 A3Mailer Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use retention::Settings;

/// BeeKeeper manages and deletes backups following a configurable
/// Grandfather-Father-Son (GFS) retention policy, with separate retention
/// windows for daily, weekly, monthly and yearly backups.
#[derive(Parser, Debug, Clone)]
#[command(name = "beekeeper", version)]
pub struct Cli {
    /// Path to the backups
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Report what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Use the date in the file name to determine file age
    #[arg(long)]
    pub use_filename: bool,

    /// Search subdirectories for backups
    #[arg(long)]
    pub recursive: bool,

    /// Remove folders left empty after deletion (requires --recursive)
    #[arg(long)]
    pub clean_folders: bool,

    /// Descend into symlinked directories when recursing
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Delete without asking for confirmation
    #[arg(long)]
    pub force: bool,

    /// Maximum age for daily backups [default: 30]
    #[arg(long, value_name = "DAYS")]
    pub max_age_daily: Option<u32>,

    /// Maximum age for weekly backups [default: 365]
    #[arg(long, value_name = "DAYS")]
    pub max_age_weekly: Option<u32>,

    /// Maximum age for monthly backups [default: 1095]
    #[arg(long, value_name = "DAYS")]
    pub max_age_monthly: Option<u32>,

    /// Maximum age for yearly backups [default: 1095]
    #[arg(long, value_name = "DAYS")]
    pub max_age_yearly: Option<u32>,

    /// Logging level
    #[arg(long, value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Append log output to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// TOML settings file; command line options take precedence
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    #[value(alias = "warn")]
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

impl Cli {
    /// Overlay command line options on `base`.
    ///
    /// Switches can only be turned on from the command line.
    pub fn apply_to(&self, mut base: Settings) -> Settings {
        let retention = &mut base.retention;
        if let Some(days) = self.max_age_daily {
            retention.max_age_daily = days;
        }
        if let Some(days) = self.max_age_weekly {
            retention.max_age_weekly = days;
        }
        if let Some(days) = self.max_age_monthly {
            retention.max_age_monthly = days;
        }
        if let Some(days) = self.max_age_yearly {
            retention.max_age_yearly = days;
        }

        let options = &mut base.options;
        options.dry_run |= self.dry_run;
        options.use_filename |= self.use_filename;
        options.recursive |= self.recursive;
        options.clean_folders |= self.clean_folders;
        options.follow_symlinks |= self.follow_symlinks;

        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use retention::RetentionConfig;

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["beekeeper", "/backups"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("/backups"));
        assert_eq!(cli.log_level, LogLevel::Info);
        assert!(!cli.dry_run && !cli.force && !cli.json);

        let settings = cli.apply_to(Settings::default());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_path_is_required() {
        assert!(Cli::try_parse_from(["beekeeper"]).is_err());
    }

    #[test]
    fn test_log_level_aliases() {
        for (value, expected) in [
            ("WARNING", LogLevel::Warning),
            ("warn", LogLevel::Warning),
            ("CRITICAL", LogLevel::Critical),
            ("debug", LogLevel::Debug),
        ] {
            let cli =
                Cli::try_parse_from(["beekeeper", "/backups", "--log-level", value]).unwrap();
            assert_eq!(cli.log_level, expected, "{value}");
        }
        assert_eq!(LogLevel::Critical.as_filter(), "error");
    }

    #[test]
    fn test_flags_override_file_settings() {
        let cli = Cli::try_parse_from([
            "beekeeper",
            "/backups",
            "--max-age-daily",
            "7",
            "--recursive",
            "--clean-folders",
        ])
        .unwrap();

        let mut base = Settings::default();
        base.retention = RetentionConfig::new(14, 90, 400, 800);
        base.options.dry_run = true;

        let settings = cli.apply_to(base);
        assert_eq!(settings.retention, RetentionConfig::new(7, 90, 400, 800));
        assert!(settings.options.dry_run);
        assert!(settings.options.recursive);
        assert!(settings.options.clean_folders);
        assert!(settings.validate().is_ok());
    }
}
