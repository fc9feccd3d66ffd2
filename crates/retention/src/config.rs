/*
 * SPDX-FileCopyrightText: 2024 A3Mailer Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! Configuration for retention runs

use crate::error::{RetentionError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub const DEFAULT_MAX_AGE_DAILY: u32 = 30;
pub const DEFAULT_MAX_AGE_WEEKLY: u32 = 365;
pub const DEFAULT_MAX_AGE_MONTHLY: u32 = 1095;
pub const DEFAULT_MAX_AGE_YEARLY: u32 = 3 * 365;

/// Top-level settings, as read from a TOML file and overridden by flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub retention: RetentionConfig,
    pub options: RunOptions,
}

/// Tier boundaries, in days relative to `now`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub max_age_daily: u32,
    pub max_age_weekly: u32,
    pub max_age_monthly: u32,
    pub max_age_yearly: u32,
}

/// Switches controlling discovery and deletion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub use_filename: bool,
    pub recursive: bool,
    pub clean_folders: bool,
    pub follow_symlinks: bool,
}

impl Settings {
    /// Load settings from a TOML file. Missing keys take their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading settings from: {:?}", path);

        let content = std::fs::read_to_string(path).map_err(|e| {
            RetentionError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Ok(toml::from_str(&content)?)
    }

    /// Check everything that must hold before any item is classified.
    pub fn validate(&self) -> Result<()> {
        self.retention.validate()?;

        if self.options.clean_folders && !self.options.recursive {
            return Err(RetentionError::Config(
                "clean_folders requires recursive".to_string(),
            ));
        }

        Ok(())
    }
}

impl RetentionConfig {
    pub fn new(daily: u32, weekly: u32, monthly: u32, yearly: u32) -> Self {
        Self {
            max_age_daily: daily,
            max_age_weekly: weekly,
            max_age_monthly: monthly,
            max_age_yearly: yearly,
        }
    }

    /// Report boundaries that are not monotonically non-decreasing.
    ///
    /// The engine still evaluates an unordered config as given; this check is
    /// for callers that want to refuse such a policy up front.
    pub fn validate(&self) -> Result<()> {
        if self.max_age_daily > self.max_age_weekly
            || self.max_age_weekly > self.max_age_monthly
            || self.max_age_monthly > self.max_age_yearly
        {
            return Err(RetentionError::TierOrder {
                daily: self.max_age_daily,
                weekly: self.max_age_weekly,
                monthly: self.max_age_monthly,
                yearly: self.max_age_yearly,
            });
        }

        Ok(())
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_daily: DEFAULT_MAX_AGE_DAILY,
            max_age_weekly: DEFAULT_MAX_AGE_WEEKLY,
            max_age_monthly: DEFAULT_MAX_AGE_MONTHLY,
            max_age_yearly: DEFAULT_MAX_AGE_YEARLY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = RetentionConfig::default();
        assert_eq!(config, RetentionConfig::new(30, 365, 1095, 1095));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tier_order_violation() {
        let err = RetentionConfig::new(400, 365, 1095, 1095)
            .validate()
            .unwrap_err();
        assert!(matches!(err, RetentionError::TierOrder { daily: 400, .. }));

        assert!(RetentionConfig::new(30, 365, 2000, 1095).validate().is_err());
        assert!(RetentionConfig::new(7, 7, 7, 7).validate().is_ok());
    }

    #[test]
    fn test_clean_folders_requires_recursive() {
        let mut settings = Settings::default();
        settings.options.clean_folders = true;
        assert!(matches!(settings.validate(), Err(RetentionError::Config(_))));

        settings.options.recursive = true;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("beekeeper.toml");
        std::fs::write(
            &path,
            "[retention]\nmax_age_daily = 7\n\n[options]\nrecursive = true\n",
        )
        .unwrap();

        let settings = Settings::load_from_file(&path).unwrap();
        assert_eq!(settings.retention.max_age_daily, 7);
        assert_eq!(settings.retention.max_age_weekly, DEFAULT_MAX_AGE_WEEKLY);
        assert!(settings.options.recursive);
        assert!(!settings.options.dry_run);
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        std::fs::write(&path, "[retention\nmax_age_daily = ").unwrap();

        assert!(matches!(
            Settings::load_from_file(&path),
            Err(RetentionError::Config(_))
        ));
        assert!(matches!(
            Settings::load_from_file(temp_dir.path().join("missing.toml")),
            Err(RetentionError::Config(_))
        ));
    }
}
