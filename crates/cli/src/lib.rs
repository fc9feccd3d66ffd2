/*
 * SPDX-FileCopyrightText: 2024 A3Mailer Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

//! BeeKeeper CLI Library
//!
//! Command line front end for the `retention` crate: argument parsing,
//! logging setup, the confirmation prompt and the run report.

pub mod modules;

pub use modules::{
    cli::{Cli, LogLevel},
    confirm::confirm_deletion,
    report::{render_json, render_text},
};

use std::io::{BufRead, Write};

use anyhow::Context;
use chrono::NaiveDateTime;
use retention::{RetentionService, RunReport, Settings};
use tracing::info;

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    Finished(Box<RunReport>),
    /// The operator declined the deletion prompt; nothing was touched
    Declined,
}

impl RunOutcome {
    /// Process exit status: 2 when some deletions failed, 0 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Finished(report) if report.has_errors() => 2,
            _ => 0,
        }
    }
}

/// Resolve settings from the optional settings file and the flags.
pub fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let base = match &cli.config {
        Some(path) => Settings::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    Ok(cli.apply_to(base))
}

/// Run BeeKeeper against `cli.path`.
///
/// The confirmation prompt is written to `prompt` and answered from `input`;
/// the report goes to `output`.
pub async fn run<R, P, W>(
    cli: &Cli,
    now: NaiveDateTime,
    input: R,
    prompt: P,
    mut output: W,
) -> anyhow::Result<RunOutcome>
where
    R: BufRead,
    P: Write,
    W: Write,
{
    let settings = load_settings(cli)?;
    let service = RetentionService::new(settings).context("Invalid retention settings")?;

    let planned = service
        .plan(&cli.path, now)
        .await
        .with_context(|| format!("Cannot process {}", cli.path.display()))?;

    let options = service.settings().options;
    if !options.dry_run && !cli.force && planned.delete_count() > 0 {
        let confirmed = confirm_deletion(planned.delete_count(), &cli.path, input, prompt)
            .context("Failed to read confirmation")?;
        if !confirmed {
            info!("Deletion declined by operator");
            writeln!(output, "Aborted, nothing was deleted.")?;
            return Ok(RunOutcome::Declined);
        }
    }

    let report = service.apply(&planned).await;

    if cli.json {
        writeln!(output, "{}", render_json(&report)?)?;
    } else {
        write!(output, "{}", render_text(&report))?;
    }

    Ok(RunOutcome::Finished(Box::new(report)))
}
