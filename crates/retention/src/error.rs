/*
 * SPDX-FileCopyrightText: 2024 A3Mailer Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! Error types for retention runs

use std::path::PathBuf;
use thiserror::Error;

/// Result type for retention operations
pub type Result<T> = std::result::Result<T, RetentionError>;

/// Retention errors
#[derive(Error, Debug)]
pub enum RetentionError {
    #[error("Invalid path {}: {reason}", path.display())]
    InvalidPath { path: PathBuf, reason: String },

    #[error("No recognized date pattern in file name: {name}")]
    AgeResolution { name: String },

    #[error(
        "Age thresholds must be non-decreasing (daily {daily} <= weekly {weekly} <= monthly {monthly} <= yearly {yearly})"
    )]
    TierOrder {
        daily: u32,
        weekly: u32,
        monthly: u32,
        yearly: u32,
    },

    #[error("Error deleting {}: {source}", path.display())]
    Deletion {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for RetentionError {
    fn from(err: toml::de::Error) -> Self {
        RetentionError::Config(err.to_string())
    }
}
