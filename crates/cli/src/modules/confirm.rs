/*
 * SPDX-FileCopyrightText: 2024 A3Mailer Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{
    io::{BufRead, Write},
    path::Path,
};

use console::style;

/// Ask the operator before deleting `count` items under `root`.
///
/// Only `y` or `yes` confirms. An empty answer or end of input declines.
pub fn confirm_deletion<R: BufRead, W: Write>(
    count: usize,
    root: &Path,
    mut input: R,
    mut output: W,
) -> std::io::Result<bool> {
    write!(
        output,
        "\nAbout to delete {} item(s) under {}. Continue? [y/N] ",
        style(count).bold(),
        style(root.display()).bold().dim()
    )?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Ok(false);
    }

    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
