/*
 * SPDX-FileCopyrightText: 2024 A3Mailer Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::process::ExitCode;

use beekeeper_cli::{modules::logging, run, Cli};
use chrono::Local;
use clap::Parser;
use console::style;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    if let Err(err) = logging::init(args.log_level, args.log_file.as_deref()) {
        eprintln!("{} {:#}", style("error:").red().bold(), err);
        return ExitCode::FAILURE;
    }

    let now = Local::now().naive_local();
    let stdin = std::io::stdin();

    match run(
        &args,
        now,
        stdin.lock(),
        std::io::stderr(),
        std::io::stdout(),
    )
    .await
    {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("{} {:#}", style("error:").red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
