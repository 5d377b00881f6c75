//! Config command handlers.

use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, json_document};
use crate::{CliOutput, Invocation, format_error_output, format_ndjson_summary, log_info};
use svcplus_infra::{ConfigShowFormat, check_config, load_effective_config};

/// Print the effective config with secrets redacted.
pub fn run_config_show(
    mode: OutputMode,
    invocation: &Invocation,
    format: ConfigShowFormat,
) -> Result<CliOutput, CliError> {
    let effective = match load_effective_config(
        invocation.env(),
        invocation.config_path(),
        invocation.working_dir(),
    ) {
        Ok(effective) => effective,
        Err(error) => return Ok(format_error_output(mode, &error, String::new())),
    };
    let machine = mode.is_json() || mode.is_ndjson();
    let rendered = match effective.render(if machine {
        ConfigShowFormat::Json
    } else {
        format
    }) {
        Ok(rendered) => rendered,
        Err(error) => return Ok(format_error_output(mode, &error, String::new())),
    };

    let mut stderr = String::new();
    log_info(&mut stderr, "config show completed", mode.no_progress);

    let stdout = if machine {
        let config_value: serde_json::Value = serde_json::from_str(rendered.trim())?;
        if mode.is_ndjson() {
            format_ndjson_summary(
                "ok",
                "config",
                Some(serde_json::json!({
                    "configPath": effective.source,
                    "effectiveConfig": config_value,
                })),
            )?
        } else {
            json_document(&serde_json::json!({
                "status": "ok",
                "configPath": effective.source,
                "effectiveConfig": config_value,
            }))?
        }
    } else {
        rendered
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

/// Load and validate the effective config.
pub fn run_config_check(mode: OutputMode, invocation: &Invocation) -> Result<CliOutput, CliError> {
    let report = match check_config(
        invocation.env(),
        invocation.config_path(),
        invocation.working_dir(),
    ) {
        Ok(report) => report,
        Err(error) => return Ok(format_error_output(mode, &error, String::new())),
    };

    let mut stderr = String::new();
    log_info(&mut stderr, "config check completed", mode.no_progress);

    let stdout = if mode.is_ndjson() {
        format_ndjson_summary("ok", "config", Some(serde_json::to_value(&report)?))?
    } else if mode.is_json() {
        json_document(&serde_json::json!({
            "status": "ok",
            "report": report,
        }))?
    } else {
        let mut out = String::from("status: ok\nconfig: ok\n");
        if let Some(source) = report.source.as_ref() {
            out.push_str("path: ");
            out.push_str(&source.to_string_lossy());
            out.push('\n');
        }
        out.push_str(&format!("envOverrides: {}\n", report.env_overrides));
        out
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}
