//! Shared utilities for CLI commands

use std::fmt;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and the database lock is released.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Empty: ExitCode is control flow, not a message for stderr.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// `v003` style version label.
pub(crate) fn version_label(version: u32) -> String {
    format!("v{version:03}")
}

/// Comma-separated version labels, or `none`.
pub(crate) fn version_list(versions: &[u32]) -> String {
    if versions.is_empty() {
        return "none".to_string();
    }
    versions
        .iter()
        .map(|&v| version_label(v))
        .collect::<Vec<_>>()
        .join(", ")
}
