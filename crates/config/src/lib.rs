//! # svcplus-config
//!
//! Configuration schema, env overrides, and file loading for the CLI.
//! This crate depends on `domain` and `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (env + file + defaults).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use schema::{
    AgentConfig, CURRENT_CONFIG_VERSION, ConfigSchemaError, DEFAULT_AGENT_DIR,
    DEFAULT_DASHBOARDS_DIR, DEFAULT_DATASOURCE_UID, DEFAULT_DOCKER_BINARY, DEFAULT_MAPPING_PATH,
    DEFAULT_STEP_DELAY_MS, DockerConfig, MetricsConfig, ModulesConfig, RabbitMqConfig,
    SvcplusConfig, TemplatesConfig, ValidatedSvcplusConfig, parse_config_json, parse_config_toml,
};

pub use env::{ENV_PREFIX, EnvParseError, SvcplusEnv, apply_env_overrides, collect_scoped_env};
pub use load::{
    ConfigFormat, DEFAULT_CONFIG_PATH, load_config_from_path, load_config_from_sources,
    load_config_std_env, resolve_config_path, to_pretty_json, to_pretty_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
