//! Environment variable parsing and env-to-config merging.
//!
//! Env parsing is strict: a variable that is present but empty or malformed
//! fails instead of being ignored. Secret values are redacted in error
//! metadata.

use crate::schema::{SvcplusConfig, ValidatedSvcplusConfig};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use svcplus_domain::{ObserverType, TextEncoding};
use svcplus_shared::{ErrorCode, ErrorEnvelope, REDACTED_VALUE, SecretString, is_secret_key};

/// Prefix shared by every svcplus env var.
pub const ENV_PREFIX: &str = "SVCPLUS_";

/// Env var: `metrics.mappingPath`.
pub const ENV_METRICS_MAPPING_PATH: &str = "SVCPLUS_METRICS_MAPPING_PATH";
/// Env var: `metrics.dashboardsDir`.
pub const ENV_METRICS_DASHBOARDS_DIR: &str = "SVCPLUS_METRICS_DASHBOARDS_DIR";
/// Env var: `metrics.outputEncoding` (`utf-8` or `ascii`).
pub const ENV_METRICS_OUTPUT_ENCODING: &str = "SVCPLUS_METRICS_OUTPUT_ENCODING";
/// Env var: `metrics.metricName`.
pub const ENV_METRICS_METRIC_NAME: &str = "SVCPLUS_METRICS_METRIC_NAME";
/// Env var: `metrics.observerType` (`summary` or `histogram`).
pub const ENV_METRICS_OBSERVER_TYPE: &str = "SVCPLUS_METRICS_OBSERVER_TYPE";
/// Env var: `metrics.datasourceUid`.
pub const ENV_METRICS_DATASOURCE_UID: &str = "SVCPLUS_METRICS_DATASOURCE_UID";
/// Env var: `templates.root`.
pub const ENV_TEMPLATES_ROOT: &str = "SVCPLUS_TEMPLATES_ROOT";
/// Env var: `modules.root`.
pub const ENV_MODULES_ROOT: &str = "SVCPLUS_MODULES_ROOT";
/// Env var: `agent.dir`.
pub const ENV_AGENT_DIR: &str = "SVCPLUS_AGENT_DIR";
/// Env var: `docker.binary`.
pub const ENV_DOCKER_BINARY: &str = "SVCPLUS_DOCKER_BINARY";
/// Env var: `docker.network`.
pub const ENV_DOCKER_NETWORK: &str = "SVCPLUS_DOCKER_NETWORK";
/// Env var: `docker.stepDelayMs`.
pub const ENV_DOCKER_STEP_DELAY_MS: &str = "SVCPLUS_DOCKER_STEP_DELAY_MS";
/// Env var: `rabbitmq.user`.
pub const ENV_RABBITMQ_USER: &str = "SVCPLUS_RABBITMQ_USER";
/// Env var: `rabbitmq.password` (secret).
pub const ENV_RABBITMQ_PASSWORD: &str = "SVCPLUS_RABBITMQ_PASSWORD";

/// Parsed env overrides. `None` means the variable was not set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SvcplusEnv {
    /// Override for `metrics.mappingPath`.
    pub metrics_mapping_path: Option<PathBuf>,
    /// Override for `metrics.dashboardsDir`.
    pub metrics_dashboards_dir: Option<PathBuf>,
    /// Override for `metrics.outputEncoding`.
    pub metrics_output_encoding: Option<TextEncoding>,
    /// Override for `metrics.metricName`.
    pub metrics_metric_name: Option<Box<str>>,
    /// Override for `metrics.observerType`.
    pub metrics_observer_type: Option<ObserverType>,
    /// Override for `metrics.datasourceUid`.
    pub metrics_datasource_uid: Option<Box<str>>,
    /// Override for `templates.root`.
    pub templates_root: Option<PathBuf>,
    /// Override for `modules.root`.
    pub modules_root: Option<PathBuf>,
    /// Override for `agent.dir`.
    pub agent_dir: Option<PathBuf>,
    /// Override for `docker.binary`.
    pub docker_binary: Option<Box<str>>,
    /// Override for `docker.network`.
    pub docker_network: Option<Box<str>>,
    /// Override for `docker.stepDelayMs`.
    pub docker_step_delay_ms: Option<u64>,
    /// Override for `rabbitmq.user`.
    pub rabbitmq_user: Option<Box<str>>,
    /// Override for `rabbitmq.password`.
    pub rabbitmq_password: Option<SecretString>,
}

impl SvcplusEnv {
    /// Parse overrides from an env map.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            metrics_mapping_path: parse_optional_path(map, ENV_METRICS_MAPPING_PATH)?,
            metrics_dashboards_dir: parse_optional_path(map, ENV_METRICS_DASHBOARDS_DIR)?,
            metrics_output_encoding: parse_optional_enum(
                map,
                ENV_METRICS_OUTPUT_ENCODING,
                TextEncoding::parse,
            )?,
            metrics_metric_name: parse_optional_trimmed_string(map, ENV_METRICS_METRIC_NAME)?,
            metrics_observer_type: parse_optional_enum(
                map,
                ENV_METRICS_OBSERVER_TYPE,
                parse_observer_type,
            )?,
            metrics_datasource_uid: parse_optional_trimmed_string(
                map,
                ENV_METRICS_DATASOURCE_UID,
            )?,
            templates_root: parse_optional_path(map, ENV_TEMPLATES_ROOT)?,
            modules_root: parse_optional_path(map, ENV_MODULES_ROOT)?,
            agent_dir: parse_optional_path(map, ENV_AGENT_DIR)?,
            docker_binary: parse_optional_trimmed_string(map, ENV_DOCKER_BINARY)?,
            docker_network: parse_optional_trimmed_string(map, ENV_DOCKER_NETWORK)?,
            docker_step_delay_ms: parse_optional_u64(map, ENV_DOCKER_STEP_DELAY_MS)?,
            rabbitmq_user: parse_optional_trimmed_string(map, ENV_RABBITMQ_USER)?,
            rabbitmq_password: parse_optional_secret(map, ENV_RABBITMQ_PASSWORD)?,
        })
    }

    /// Parse overrides from the process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        Self::from_map(&collect_scoped_env())
    }
}

/// Collect `SVCPLUS_*` variables from the process environment.
#[must_use]
pub fn collect_scoped_env() -> BTreeMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(ENV_PREFIX))
        .collect()
}

/// Apply env overrides to a base config (env wins over file/default values).
pub fn apply_env_overrides(
    base: SvcplusConfig,
    env: &SvcplusEnv,
) -> Result<ValidatedSvcplusConfig, ErrorEnvelope> {
    let mut config = base;
    let metrics = &mut config.metrics;
    set(&mut metrics.mapping_path, env.metrics_mapping_path.clone());
    set(
        &mut metrics.dashboards_dir,
        env.metrics_dashboards_dir.clone(),
    );
    set(&mut metrics.output_encoding, env.metrics_output_encoding);
    set(&mut metrics.metric_name, env.metrics_metric_name.clone());
    set(&mut metrics.observer_type, env.metrics_observer_type);
    set(
        &mut metrics.datasource_uid,
        env.metrics_datasource_uid.clone(),
    );

    if env.templates_root.is_some() {
        config.templates.root.clone_from(&env.templates_root);
    }
    if env.modules_root.is_some() {
        config.modules.root.clone_from(&env.modules_root);
    }
    set(&mut config.agent.dir, env.agent_dir.clone());

    set(&mut config.docker.binary, env.docker_binary.clone());
    set(&mut config.docker.network, env.docker_network.clone());
    set(&mut config.docker.step_delay_ms, env.docker_step_delay_ms);

    set(&mut config.rabbitmq.user, env.rabbitmq_user.clone());
    set(&mut config.rabbitmq.password, env.rabbitmq_password.clone());

    config.validate().map_err(Into::into)
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Env parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// A secret env var was present but empty after trimming.
    EmptySecret {
        /// Env var name.
        var: &'static str,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Enum env var had an unsupported value.
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } | Self::EmptySecret { .. } => {
                ErrorCode::new("config", "empty_env_var")
            },
            Self::InvalidInt { .. } => ErrorCode::new("config", "invalid_env_int"),
            Self::InvalidEnum { .. } => ErrorCode::new("config", "invalid_env_enum"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } | Self::EmptySecret { var } => {
                write!(formatter, "{var} must be non-empty")
            },
            Self::InvalidInt { var, .. } => write!(formatter, "{var} must be an integer"),
            Self::InvalidEnum { var, .. } => write!(formatter, "{var} has an unsupported value"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            EnvParseError::EmptyValue { var } | EnvParseError::EmptySecret { var } => {
                envelope.with_metadata("env_var", var)
            },
            EnvParseError::InvalidInt { var, value }
            | EnvParseError::InvalidEnum { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", redact_value(var, &value)),
        }
    }
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    Ok(Some(trimmed.to_owned().into_boxed_str()))
}

fn parse_optional_path(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<PathBuf>, EnvParseError> {
    Ok(parse_optional_trimmed_string(map, var)?.map(|value| PathBuf::from(&*value)))
}

fn parse_optional_secret(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<SecretString>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptySecret { var });
    }

    Ok(Some(SecretString::new(trimmed.to_owned())))
}

fn parse_optional_u64(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u64>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: raw.clone(),
        })
}

fn parse_optional_enum<T>(
    map: &BTreeMap<String, String>,
    var: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    parse(raw).map(Some).ok_or_else(|| EnvParseError::InvalidEnum {
        var,
        value: raw.clone(),
    })
}

fn parse_observer_type(value: &str) -> Option<ObserverType> {
    match value.trim().to_ascii_lowercase().as_str() {
        "summary" => Some(ObserverType::Summary),
        "histogram" => Some(ObserverType::Histogram),
        _ => None,
    }
}

fn redact_value(var: &str, value: &str) -> String {
    if is_secret_key(var) {
        REDACTED_VALUE.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn missing_vars_parse_to_none() -> Result<(), Box<dyn Error>> {
        let env = SvcplusEnv::from_map(&BTreeMap::new())?;
        assert_eq!(env, SvcplusEnv::default());
        Ok(())
    }

    #[test]
    fn enum_values_are_case_insensitive() -> Result<(), Box<dyn Error>> {
        let env = SvcplusEnv::from_map(&map(&[
            (ENV_METRICS_OUTPUT_ENCODING, "ASCII"),
            (ENV_METRICS_OBSERVER_TYPE, " Histogram "),
        ]))?;
        assert_eq!(env.metrics_output_encoding, Some(TextEncoding::Ascii));
        assert_eq!(env.metrics_observer_type, Some(ObserverType::Histogram));
        Ok(())
    }

    #[test]
    fn invalid_int_is_rejected() {
        let result = SvcplusEnv::from_map(&map(&[(ENV_DOCKER_STEP_DELAY_MS, "soon")]));
        assert_eq!(
            result,
            Err(EnvParseError::InvalidInt {
                var: ENV_DOCKER_STEP_DELAY_MS,
                value: "soon".to_string(),
            })
        );
    }

    #[test]
    fn empty_secret_is_rejected_without_leaking() {
        let Err(error) = SvcplusEnv::from_map(&map(&[(ENV_RABBITMQ_PASSWORD, "  ")])) else {
            return;
        };
        let envelope: ErrorEnvelope = error.into();
        assert_eq!(envelope.code, ErrorCode::new("config", "empty_env_var"));
        assert!(!envelope.metadata.contains_key("value"));
    }

    #[test]
    fn secret_values_are_redacted_in_metadata() {
        let envelope: ErrorEnvelope = EnvParseError::InvalidEnum {
            var: ENV_RABBITMQ_PASSWORD,
            value: "hunter2".to_string(),
        }
        .into();
        assert_eq!(
            envelope.metadata.get("value").map(String::as_str),
            Some(REDACTED_VALUE)
        );
    }

    #[test]
    fn env_wins_over_base_config() -> Result<(), Box<dyn Error>> {
        let env = SvcplusEnv::from_map(&map(&[
            (ENV_DOCKER_STEP_DELAY_MS, "0"),
            (ENV_RABBITMQ_USER, "svc"),
            (ENV_TEMPLATES_ROOT, "/opt/templates"),
        ]))?;
        let config = apply_env_overrides(SvcplusConfig::default(), &env)?;
        assert_eq!(config.docker.step_delay_ms, 0);
        assert_eq!(&*config.rabbitmq.user, "svc");
        assert_eq!(config.templates.root, Some(PathBuf::from("/opt/templates")));
        Ok(())
    }
}
