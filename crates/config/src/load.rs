//! Config loading helpers (env + file + defaults).
//!
//! The loader owns the merge order and surfaces user-facing errors as
//! typed `ErrorEnvelope`s.

use crate::{SvcplusConfig, SvcplusEnv, ValidatedSvcplusConfig, apply_env_overrides};
use std::path::{Path, PathBuf};
use svcplus_shared::{ErrorClass, ErrorCode, ErrorEnvelope};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_PATH: &str = ".svcplus/config.toml";

/// Config file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON document.
    Json,
    /// TOML document.
    Toml,
}

/// Load the config from in-memory sources.
///
/// Precedence (highest wins):
/// - env overrides (`SvcplusEnv`)
/// - config document
/// - defaults (`SvcplusConfig::default()`)
pub fn load_config_from_sources(
    config_text: Option<(&str, ConfigFormat)>,
    env: &SvcplusEnv,
) -> Result<ValidatedSvcplusConfig, ErrorEnvelope> {
    let config = match config_text {
        None => SvcplusConfig::default(),
        Some((input, format)) => parse_config_unvalidated(input, format)?,
    };

    // env is applied last and also validates the resulting config.
    apply_env_overrides(config, env)
}

/// Load the config from an optional file path.
pub fn load_config_from_path(
    config_path: Option<&Path>,
    env: &SvcplusEnv,
) -> Result<ValidatedSvcplusConfig, ErrorEnvelope> {
    let config = match config_path {
        None => SvcplusConfig::default(),
        Some(path) => {
            let config_text = read_config_file(path)?;
            let format = detect_config_format(path)?;
            parse_config_unvalidated(&config_text, format)?
        },
    };

    apply_env_overrides(config, env)
}

/// Load the config from the process env and an optional file path.
pub fn load_config_std_env(
    config_path: Option<&Path>,
) -> Result<ValidatedSvcplusConfig, ErrorEnvelope> {
    let env = SvcplusEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    load_config_from_path(config_path, &env)
}

/// Pick the config file: the explicit path, or the default file under
/// `working_dir` when it exists.
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>, working_dir: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let candidate = working_dir.join(DEFAULT_CONFIG_PATH);
    candidate.is_file().then_some(candidate)
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
pub fn to_pretty_json(config: &SvcplusConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the config as deterministic pretty TOML (with trailing newline).
pub fn to_pretty_toml(config: &SvcplusConfig) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    if !output.ends_with('\n') {
        output.push('\n');
    }
    Ok(output)
}

fn parse_config_unvalidated(
    input: &str,
    format: ConfigFormat,
) -> Result<SvcplusConfig, ErrorEnvelope> {
    match format {
        ConfigFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid config JSON: {error}"),
            )
            .with_metadata("source", "config")
        }),
        ConfigFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid config TOML: {error}"),
            )
            .with_metadata("source", "config")
        }),
    }
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "config_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "config_file_permission_denied")
            },
            _ => ErrorCode::new("config", "config_file_io"),
        };

        ErrorEnvelope::expected(code, format!("failed to read config file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn detect_config_format(path: &Path) -> Result<ConfigFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("toml") => Ok(ConfigFormat::Toml),
        Some("json") => Ok(ConfigFormat::Json),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported config format; use .toml or .json",
        )
        .with_metadata("extension", other.to_string())),
    }
}
