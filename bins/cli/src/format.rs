//! Output format helpers for CLI commands.

use crate::error::CliError;
use clap::{Args, ValueEnum};
use serde::Serialize;

/// Output format choices for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-friendly `key: value` lines.
    Text,
    /// Pretty-printed JSON document.
    Json,
    /// One JSON object per line.
    Ndjson,
}

/// Output-related CLI flags.
#[derive(Debug, Args)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "CLI flags are intentionally boolean to keep UX predictable."
)]
pub struct OutputArgs {
    /// Output format for command responses.
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputFormat>,
    /// Emit machine-friendly defaults (NDJSON output, no progress lines).
    #[arg(long, global = true)]
    pub agent: bool,
    /// Suppress progress lines on stderr.
    #[arg(long, global = true)]
    pub no_progress: bool,
    /// Keep progress lines even when other flags would hide them.
    #[arg(long, global = true)]
    pub interactive: bool,
    /// Shorthand for `--output json`.
    #[arg(long, global = true)]
    pub json: bool,
}

/// Output mode derived from CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct OutputMode {
    pub format: OutputFormat,
    pub no_progress: bool,
}

impl OutputMode {
    /// Build output mode from CLI flags.
    #[must_use]
    pub const fn from_args(args: &OutputArgs) -> Self {
        let format = match (args.output, args.json, args.agent) {
            (Some(value), _, _) => value,
            (None, true, _) => OutputFormat::Json,
            (None, false, true) => OutputFormat::Ndjson,
            (None, false, false) => OutputFormat::Text,
        };

        let no_progress = if args.agent {
            true
        } else if args.interactive {
            false
        } else {
            args.no_progress
        };

        Self {
            format,
            no_progress,
        }
    }

    /// Returns true when JSON output is requested.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Returns true when NDJSON output is requested.
    #[must_use]
    pub const fn is_ndjson(self) -> bool {
        matches!(self.format, OutputFormat::Ndjson)
    }
}

/// Pretty JSON followed by a newline.
pub fn json_document<T: Serialize + ?Sized>(payload: &T) -> Result<String, CliError> {
    let mut out = serde_json::to_string_pretty(payload)?;
    out.push('\n');
    Ok(out)
}

/// Compact JSON on a single line.
pub fn ndjson_line<T: Serialize + ?Sized>(payload: &T) -> Result<String, CliError> {
    let mut out = serde_json::to_string(payload)?;
    out.push('\n');
    Ok(out)
}
