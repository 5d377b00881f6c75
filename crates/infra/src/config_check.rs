//! Config loading helpers for CLI surfaces.

use crate::InfraResult;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use svcplus_config::{
    SvcplusEnv, ValidatedSvcplusConfig, load_config_from_path, resolve_config_path,
    to_pretty_json, to_pretty_toml,
};
use svcplus_shared::ErrorEnvelope;

/// Config together with the file it was read from.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    /// Config file used, if any.
    pub source: Option<PathBuf>,
    /// Validated, env-merged config.
    pub config: ValidatedSvcplusConfig,
}

/// Rendering of `config show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigShowFormat {
    /// Pretty JSON.
    Json,
    /// Pretty TOML.
    Toml,
}

/// Outcome of `config check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigCheckReport {
    /// Config file used, if any.
    pub source: Option<PathBuf>,
    /// Number of `SVCPLUS_*` variables considered.
    pub env_overrides: usize,
}

/// Load the effective config from `env`, an optional explicit file, and the
/// default file under `working_dir`.
pub fn load_effective_config(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    working_dir: &Path,
) -> InfraResult<EffectiveConfig> {
    let parsed = SvcplusEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    let source = resolve_config_path(config_path, working_dir)
        .map(|path| crate::resolve_path(working_dir, &path));
    let config = load_config_from_path(source.as_deref(), &parsed)?;
    tracing::debug!(
        source = ?source,
        env_overrides = env.len(),
        "loaded effective config"
    );
    Ok(EffectiveConfig { source, config })
}

impl EffectiveConfig {
    /// Config with secrets redacted, rendered as `format`.
    pub fn render(&self, format: ConfigShowFormat) -> InfraResult<String> {
        let redacted = self.config.redacted();
        match format {
            ConfigShowFormat::Json => to_pretty_json(&redacted),
            ConfigShowFormat::Toml => to_pretty_toml(&redacted),
        }
    }
}

/// Validate the effective config without running anything.
pub fn check_config(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    working_dir: &Path,
) -> InfraResult<ConfigCheckReport> {
    let effective = load_effective_config(env, config_path, working_dir)?;
    Ok(ConfigCheckReport {
        source: effective.source,
        env_overrides: env.len(),
    })
}
