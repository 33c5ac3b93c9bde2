// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! JSON rendering of command results and errors.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use serde_json::json;

use linkboards_core::domain::errors::{BoardError, PublicError};

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Acknowledge a command that has no result body.
pub fn print_ok() -> Result<()> {
    print_json(&json!({ "status": "ok" }))
}

/// Convert a service error to its public form so internal detail never
/// reaches the terminal.
pub fn public(err: BoardError) -> anyhow::Error {
    anyhow::Error::new(PublicError::from(&err))
}

/// Report a failed command: a JSON error object on stdout for scripts and
/// a readable line on stderr.
pub fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<PublicError>() {
        Some(public) => {
            if let Ok(body) = serde_json::to_string_pretty(&json!({ "error": public })) {
                println!("{body}");
            }
            eprintln!("{} {}", "Error:".red().bold(), public);
        }
        None => eprintln!("{} {:#}", "Error:".red().bold(), err),
    }
}
