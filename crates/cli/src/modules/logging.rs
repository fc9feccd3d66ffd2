/*
 * SPDX-FileCopyrightText: 2024 A3Mailer Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! Tracing subscriber setup

use std::{fs::OpenOptions, path::Path, sync::Mutex};

use anyhow::{anyhow, Context};
use tracing_subscriber::EnvFilter;

use super::cli::LogLevel;

/// Build the event filter; `RUST_LOG` wins over `level` when set.
pub fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()))
}

/// Install the global subscriber, writing to stderr or appending to `log_file`.
pub fn init(level: LogLevel, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = env_filter(level);

    let result = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
