//! Info command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, json_document, ndjson_line};
use std::path::Path;
use svcplus_infra::{InfoSummary, LocalContext, read_info_local};

/// Run the info command.
pub fn run_info(mode: OutputMode, ctx: &LocalContext) -> Result<CliOutput, CliError> {
    let summary = read_info_local(ctx);

    let stdout = if mode.is_ndjson() {
        ndjson_line(&serde_json::json!({
            "type": "summary",
            "status": "ok",
            "kind": "info",
            "info": summary,
        }))?
    } else if mode.is_json() {
        json_document(&serde_json::json!({
            "status": "ok",
            "info": summary,
        }))?
    } else {
        format_info_text(&summary)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn format_info_text(summary: &InfoSummary) -> String {
    format!(
        "status: ok\nversion: {}\nplatform: {}\nprofile: {}\nconfig: {}\ntemplates: {}\nmodulesRoot: {}\nagentDir: {}\nmappingPath: {}\ndashboardsDir: {}\ndocker: {}\nnetwork: {}\n",
        summary.version,
        summary.platform,
        summary.profile,
        summary
            .config_source
            .as_deref()
            .map_or_else(|| "defaults".to_owned(), display),
        summary.templates,
        display(&summary.modules_root),
        display(&summary.agent_dir),
        display(&summary.mapping_path),
        display(&summary.dashboards_dir),
        summary.docker_binary,
        summary.network,
    )
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
