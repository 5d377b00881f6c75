//! CLI binary entrypoint.

mod commands;
mod error;
mod format;
mod progress;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{
    run_config_check, run_config_show, run_info, run_init, run_metric_config, run_middleware,
    run_test_gen,
};
use error::{CliError, ErrorDto, ExitCode};
use format::{OutputArgs, OutputMode, ndjson_line};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use svcplus_app::MiddlewareAction;
use svcplus_domain::UnknownKind;
use svcplus_infra::{ConfigShowFormat, InfraResult, LocalContext};
use svcplus_shared::{ErrorCode, ErrorEnvelope};

/// Env var holding the `tracing` filter directives.
const LOG_FILTER_ENV: &str = "SVCPLUS_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "svcplus",
    version,
    about = "Scaffold microservice projects and run their middleware",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    /// Config file (JSON/TOML). Defaults to `.svcplus/config.toml` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a project skeleton from a template set.
    Init {
        /// Destination directory; must be missing or empty.
        #[arg(short = 'd', long)]
        directory: PathBuf,
        /// Template kind: all, rpc, event, http, timer or demo.
        #[arg(short = 't', long = "type", default_value = "all")]
        kind: String,
    },
    /// Start a middleware.
    Start {
        /// Middleware name: rabbitmq or metrics.
        #[arg(short = 'm', long)]
        middleware: String,
    },
    /// Stop a middleware.
    Stop {
        /// Middleware name: rabbitmq or metrics.
        #[arg(short = 'm', long)]
        middleware: String,
    },
    /// Add test skeleton files to an existing project.
    #[command(name = "test-gen")]
    TestGen {
        /// Existing, non-empty project directory.
        #[arg(short = 'e', long = "existed-dir")]
        existed_dir: PathBuf,
        /// Test template kind.
        #[arg(short = 't', long = "type", default_value = "unit")]
        kind: String,
    },
    /// Generate the statsd mapping file and Grafana dashboards.
    MetricConfigGen {
        /// Dotted module path declaring the service classes.
        #[arg(short = 'm', long)]
        module: String,
        /// Comma-separated class names.
        #[arg(short = 'c', long = "class")]
        classes: String,
    },
    /// Show build details and resolved paths.
    Info,
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Print the effective config with secrets redacted.
    Show {
        /// Rendering of the config document.
        #[arg(long, value_enum, default_value_t = ShowFormat::Toml)]
        format: ShowFormat,
    },
    /// Load and validate the effective config.
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ShowFormat {
    Json,
    Toml,
}

impl From<ShowFormat> for ConfigShowFormat {
    fn from(value: ShowFormat) -> Self {
        match value {
            ShowFormat::Json => Self::Json,
            ShowFormat::Toml => Self::Toml,
        }
    }
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

/// Process-level inputs shared by every command.
pub(crate) struct Invocation {
    env: BTreeMap<String, String>,
    working_dir: PathBuf,
    config_path: Option<PathBuf>,
}

impl Invocation {
    fn from_process(config_path: Option<PathBuf>) -> Result<Self, CliError> {
        Ok(Self {
            env: svcplus_config::collect_scoped_env(),
            working_dir: std::env::current_dir()?,
            config_path,
        })
    }

    pub(crate) const fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub(crate) fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub(crate) fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    fn context(&self) -> InfraResult<LocalContext> {
        LocalContext::from_env_map(&self.env, &self.working_dir, self.config_path())
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.output.agent);
    let mode = OutputMode::from_args(&cli.output);

    let result = Invocation::from_process(cli.config.clone())
        .and_then(|invocation| run(&cli.command, mode, &invocation));
    match result {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

/// Diagnostics go to stderr; agents get one JSON object per event.
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(
    command: &Commands,
    mode: OutputMode,
    invocation: &Invocation,
) -> Result<CliOutput, CliError> {
    match command {
        Commands::Config { command } => match command {
            ConfigCommands::Show { format } => run_config_show(mode, invocation, (*format).into()),
            ConfigCommands::Check => run_config_check(mode, invocation),
        },
        Commands::Info => with_context(mode, invocation, |ctx| run_info(mode, ctx)),
        Commands::Init { directory, kind } => with_context(mode, invocation, |ctx| {
            run_init(mode, ctx, directory, kind)
        }),
        Commands::TestGen { existed_dir, kind } => with_context(mode, invocation, |ctx| {
            run_test_gen(mode, ctx, existed_dir, kind)
        }),
        Commands::MetricConfigGen { module, classes } => with_context(mode, invocation, |ctx| {
            run_metric_config(mode, ctx, module, classes)
        }),
        Commands::Start { middleware } => with_context(mode, invocation, |ctx| {
            run_middleware(mode, ctx, middleware, MiddlewareAction::Start)
        }),
        Commands::Stop { middleware } => with_context(mode, invocation, |ctx| {
            run_middleware(mode, ctx, middleware, MiddlewareAction::Stop)
        }),
    }
}

fn with_context(
    mode: OutputMode,
    invocation: &Invocation,
    handler: impl FnOnce(&LocalContext) -> Result<CliOutput, CliError>,
) -> Result<CliOutput, CliError> {
    match invocation.context() {
        Ok(ctx) => handler(&ctx),
        Err(error) => {
            tracing::warn!(code = %error.code, "configuration could not be loaded");
            Ok(format_error_output(mode, &error, String::new()))
        },
    }
}

/// Expected error for a kind name outside the allowed list.
pub(crate) fn unknown_kind_error(code: ErrorCode, error: UnknownKind) -> ErrorEnvelope {
    ErrorEnvelope::expected(code, error.to_string())
        .with_metadata("input", error.input)
        .with_metadata("expected", error.expected)
}

/// Render a failed use case in the requested format, after any progress lines.
pub(crate) fn format_error_output(
    mode: OutputMode,
    error: &ErrorEnvelope,
    mut stderr: String,
) -> CliOutput {
    let dto = ErrorDto::from_envelope(error);
    log_info(&mut stderr, "command failed", mode.no_progress);

    // This is a CLI boundary, so JSON serialization errors are internal.
    let stdout = if mode.is_ndjson() {
        let payload = serde_json::json!({
            "type": "error",
            "status": "error",
            "error": dto,
        });
        ndjson_line(&payload).unwrap_or_else(|_| {
            "{\"type\":\"error\",\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\",\"kind\":\"INVARIANT\"}}\n".to_string()
        })
    } else if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": dto,
        });
        format::json_document(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\",\"kind\":\"INVARIANT\"}}\n".to_string()
        })
    } else {
        dto.to_text()
    };

    CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::for_envelope(error),
    }
}

pub(crate) fn log_info(stderr: &mut String, message: &str, no_progress: bool) {
    if no_progress {
        return;
    }
    stderr.push_str("info: ");
    stderr.push_str(message);
    stderr.push('\n');
}

/// NDJSON summary line: `type`, `status`, `kind`, then the fields of `extra`.
pub(crate) fn format_ndjson_summary(
    status: &str,
    kind: &str,
    extra: Option<serde_json::Value>,
) -> Result<String, CliError> {
    let mut payload = serde_json::Map::new();
    payload.insert("type".to_string(), serde_json::Value::from("summary"));
    payload.insert("status".to_string(), serde_json::Value::from(status));
    payload.insert("kind".to_string(), serde_json::Value::from(kind));
    if let Some(serde_json::Value::Object(map)) = extra {
        for (key, value) in map {
            payload.insert(key, value);
        }
    }
    ndjson_line(&serde_json::Value::Object(payload))
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}
