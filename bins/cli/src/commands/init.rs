//! Init command handler.

use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, json_document};
use crate::progress::ProgressLog;
use crate::{CliOutput, format_error_output, format_ndjson_summary, unknown_kind_error};
use std::path::Path;
use svcplus_app::ScaffoldOutput;
use svcplus_domain::ProjectKind;
use svcplus_infra::{LocalContext, run_init_local};
use svcplus_shared::ErrorCode;

/// Run the init command.
pub fn run_init(
    mode: OutputMode,
    ctx: &LocalContext,
    directory: &Path,
    kind: &str,
) -> Result<CliOutput, CliError> {
    let kind = match kind.parse::<ProjectKind>() {
        Ok(kind) => kind,
        Err(error) => {
            let error = unknown_kind_error(ErrorCode::new("scaffold", "unknown_template"), error);
            return Ok(format_error_output(mode, &error, String::new()));
        },
    };

    let progress = ProgressLog::new(!mode.no_progress);
    match run_init_local(ctx, directory, kind, progress.sink()) {
        Ok(output) => format_scaffold_output(mode, "init", kind.as_str(), &output, progress.take()),
        Err(error) => Ok(format_error_output(mode, &error, progress.take())),
    }
}

/// Shared rendering for `init` and `test-gen`.
pub(crate) fn format_scaffold_output(
    mode: OutputMode,
    command: &str,
    template: &str,
    output: &ScaffoldOutput,
    stderr: String,
) -> Result<CliOutput, CliError> {
    let files: Vec<String> = output
        .files
        .iter()
        .map(|path| path.to_string_lossy().into_owned())
        .collect();

    let stdout = if mode.is_ndjson() {
        format_ndjson_summary(
            "ok",
            command,
            Some(serde_json::json!({
                "template": template,
                "directory": output.directory,
                "createdDirectory": output.created_directory,
                "files": files,
            })),
        )?
    } else if mode.is_json() {
        json_document(&serde_json::json!({
            "status": "ok",
            "template": template,
            "directory": output.directory,
            "createdDirectory": output.created_directory,
            "files": files,
        }))?
    } else {
        let mut out = format!(
            "status: ok\ntemplate: {template}\ndirectory: {}\ncreatedDirectory: {}\nfiles: {}\n",
            output.directory.to_string_lossy(),
            output.created_directory,
            files.len()
        );
        for file in &files {
            out.push_str("  ");
            out.push_str(file);
            out.push('\n');
        }
        out
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}
