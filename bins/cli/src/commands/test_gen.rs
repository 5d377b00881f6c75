//! Test-gen command handler.

use super::init::format_scaffold_output;
use crate::error::CliError;
use crate::format::OutputMode;
use crate::progress::ProgressLog;
use crate::{CliOutput, format_error_output, unknown_kind_error};
use std::path::Path;
use svcplus_domain::TestKind;
use svcplus_infra::{LocalContext, run_test_gen_local};
use svcplus_shared::ErrorCode;

/// Run the test-gen command.
pub fn run_test_gen(
    mode: OutputMode,
    ctx: &LocalContext,
    directory: &Path,
    kind: &str,
) -> Result<CliOutput, CliError> {
    let kind = match kind.parse::<TestKind>() {
        Ok(kind) => kind,
        Err(error) => {
            let error = unknown_kind_error(ErrorCode::new("scaffold", "unknown_template"), error);
            return Ok(format_error_output(mode, &error, String::new()));
        },
    };

    let progress = ProgressLog::new(!mode.no_progress);
    match run_test_gen_local(ctx, directory, kind, progress.sink()) {
        Ok(output) => {
            format_scaffold_output(mode, "test-gen", kind.as_str(), &output, progress.take())
        },
        Err(error) => Ok(format_error_output(mode, &error, progress.take())),
    }
}
