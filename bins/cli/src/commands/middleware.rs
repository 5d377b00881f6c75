//! Start/stop command handler.

use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, json_document};
use crate::progress::ProgressLog;
use crate::{CliOutput, format_error_output, format_ndjson_summary, unknown_kind_error};
use svcplus_app::{MiddlewareAction, MiddlewareOutput};
use svcplus_domain::Middleware;
use svcplus_infra::{LocalContext, run_middleware_local};
use svcplus_shared::ErrorCode;

/// Run the start or stop command.
pub fn run_middleware(
    mode: OutputMode,
    ctx: &LocalContext,
    middleware: &str,
    action: MiddlewareAction,
) -> Result<CliOutput, CliError> {
    let middleware = match middleware.parse::<Middleware>() {
        Ok(middleware) => middleware,
        Err(error) => {
            let error = unknown_kind_error(ErrorCode::invalid_input(), error);
            return Ok(format_error_output(mode, &error, String::new()));
        },
    };

    let progress = ProgressLog::new(!mode.no_progress);
    match run_middleware_local(ctx, middleware, action, progress.sink()) {
        Ok(output) => format_middleware_output(mode, &output, progress.take()),
        Err(error) => Ok(format_error_output(mode, &error, progress.take())),
    }
}

fn format_middleware_output(
    mode: OutputMode,
    output: &MiddlewareOutput,
    stderr: String,
) -> Result<CliOutput, CliError> {
    let steps: Vec<serde_json::Value> = output
        .steps
        .iter()
        .map(|step| {
            serde_json::json!({
                "label": step.label,
                "containerId": step.container.as_ref().map(ToString::to_string),
            })
        })
        .collect();

    let stdout = if mode.is_ndjson() {
        format_ndjson_summary(
            "ok",
            output.action.as_str(),
            Some(serde_json::json!({
                "middleware": output.middleware.as_str(),
                "steps": steps,
            })),
        )?
    } else if mode.is_json() {
        json_document(&serde_json::json!({
            "status": "ok",
            "middleware": output.middleware.as_str(),
            "action": output.action.as_str(),
            "steps": steps,
        }))?
    } else {
        let mut out = format!(
            "status: ok\nmiddleware: {}\naction: {}\nsteps: {}\n",
            output.middleware,
            output.action.as_str(),
            output.steps.len()
        );
        for step in &output.steps {
            out.push_str("  ");
            out.push_str(&step.label);
            if let Some(container) = step.container.as_ref() {
                out.push_str(" (");
                out.push_str(container.as_str());
                out.push(')');
            }
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
