//! Metric-config-gen command handler.

use crate::error::{CliError, ErrorDto, ExitCode};
use crate::format::{OutputMode, json_document, ndjson_line};
use crate::progress::ProgressLog;
use crate::{CliOutput, format_error_output, format_ndjson_summary, log_info};
use svcplus_app::{ArtifactKind, ArtifactReport, MetricConfigOutput};
use svcplus_infra::{LocalContext, run_metric_config_local};

/// Run the metric-config-gen command.
pub fn run_metric_config(
    mode: OutputMode,
    ctx: &LocalContext,
    module: &str,
    classes: &str,
) -> Result<CliOutput, CliError> {
    let progress = ProgressLog::new(!mode.no_progress);
    match run_metric_config_local(ctx, module, classes, progress.sink()) {
        Ok(output) => format_metric_config_output(mode, module, &output, progress.take()),
        Err(error) => Ok(format_error_output(mode, &error, progress.take())),
    }
}

fn format_metric_config_output(
    mode: OutputMode,
    module: &str,
    output: &MetricConfigOutput,
    mut stderr: String,
) -> Result<CliOutput, CliError> {
    let (status, exit_code) = output
        .first_failure()
        .map_or(("ok", ExitCode::Ok), |error| {
            ("error", ExitCode::for_envelope(error))
        });
    if output.failed_count() > 0 {
        log_info(
            &mut stderr,
            &format!("{} artifact(s) failed", output.failed_count()),
            mode.no_progress,
        );
    }

    let bindings: Vec<serde_json::Value> = output
        .bindings
        .iter()
        .map(|binding| {
            serde_json::json!({
                "class": binding.class_name.as_str(),
                "metric": binding.statsd_metric(),
            })
        })
        .collect();
    let skipped: Vec<&str> = output.skipped.iter().map(|class| class.as_str()).collect();

    let stdout = if mode.is_ndjson() {
        let mut out = String::new();
        for artifact in &output.artifacts {
            let mut payload = artifact_json(artifact);
            if let serde_json::Value::Object(map) = &mut payload {
                map.insert("type".to_owned(), serde_json::Value::from("artifact"));
            }
            out.push_str(&ndjson_line(&payload)?);
        }
        out.push_str(&format_ndjson_summary(
            status,
            "metric-config",
            Some(serde_json::json!({
                "module": module,
                "bindings": bindings.len(),
                "failed": output.failed_count(),
                "skipped": skipped,
            })),
        )?);
        out
    } else if mode.is_json() {
        let artifacts: Vec<serde_json::Value> =
            output.artifacts.iter().map(artifact_json).collect();
        json_document(&serde_json::json!({
            "status": status,
            "module": module,
            "bindings": bindings,
            "artifacts": artifacts,
            "skipped": skipped,
        }))?
    } else {
        format_text(status, module, output)
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code,
    })
}

fn artifact_json(artifact: &ArtifactReport) -> serde_json::Value {
    let (kind, class) = match &artifact.kind {
        ArtifactKind::Mapping => ("mapping", None),
        ArtifactKind::Dashboard { class } => ("dashboard", Some(class.as_str())),
    };
    serde_json::json!({
        "kind": kind,
        "class": class,
        "path": artifact.path,
        "written": artifact.is_written(),
        "error": artifact.error.as_ref().map(ErrorDto::from_envelope),
    })
}

fn format_text(status: &str, module: &str, output: &MetricConfigOutput) -> String {
    let mut out = format!(
        "status: {status}\nmodule: {module}\nbindings: {}\n",
        output.bindings.len()
    );
    for binding in output.bindings.iter() {
        out.push_str("  ");
        out.push_str(binding.class_name.as_str());
        out.push_str(": ");
        out.push_str(&binding.statsd_metric());
        out.push('\n');
    }
    for artifact in &output.artifacts {
        let label = match artifact.kind {
            ArtifactKind::Mapping => "mapping",
            ArtifactKind::Dashboard { .. } => "dashboard",
        };
        out.push_str(label);
        out.push_str(": ");
        out.push_str(&artifact.path.to_string_lossy());
        if let Some(error) = artifact.error.as_ref() {
            out.push_str(" (failed: ");
            out.push_str(&error.code.to_string());
            out.push_str(", ");
            out.push_str(&error.message);
            out.push(')');
        }
        out.push('\n');
    }
    for class in &output.skipped {
        out.push_str("skipped: ");
        out.push_str(class.as_str());
        out.push_str(" (no instrumented methods)\n");
    }
    out
}
