//! svcplus configuration schema, defaults, and validation.
//!
//! - Deserialization uses `serde` (TOML or JSON).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use svcplus_domain::{
    DEFAULT_METRIC_NAME, DEFAULT_METRICS_NETWORK, MappingOptions, ObserverType, TextEncoding,
};
use svcplus_shared::{ErrorCode, ErrorEnvelope, SecretString};

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Default exporter mapping file path.
pub const DEFAULT_MAPPING_PATH: &str = "statsd_mapping.yml";
/// Default dashboards directory.
pub const DEFAULT_DASHBOARDS_DIR: &str = "grafana_dashboards";
/// Default Grafana datasource uid referenced by dashboard panels.
pub const DEFAULT_DATASOURCE_UID: &str = "prometheus";
/// Default directory for materialized middleware assets.
pub const DEFAULT_AGENT_DIR: &str = ".svcplus/agent";
/// Default container tool binary.
pub const DEFAULT_DOCKER_BINARY: &str = "docker";
/// Default pause between container steps.
pub const DEFAULT_STEP_DELAY_MS: u64 = 500;
/// Default broker user and password.
pub const DEFAULT_RABBITMQ_USER: &str = "guest";

const STEP_DELAY_MAX_MS: u64 = 60_000;

/// Top-level svcplus configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SvcplusConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Metric-config generation settings.
    pub metrics: MetricsConfig,
    /// Project template settings.
    pub templates: TemplatesConfig,
    /// Service-module manifest settings.
    pub modules: ModulesConfig,
    /// Middleware asset settings.
    pub agent: AgentConfig,
    /// Container tool settings.
    pub docker: DockerConfig,
    /// Broker credentials.
    pub rabbitmq: RabbitMqConfig,
}

impl Default for SvcplusConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            metrics: MetricsConfig::default(),
            templates: TemplatesConfig::default(),
            modules: ModulesConfig::default(),
            agent: AgentConfig::default(),
            docker: DockerConfig::default(),
            rabbitmq: RabbitMqConfig::default(),
        }
    }
}

impl SvcplusConfig {
    /// Validate the config.
    pub fn validate(self) -> Result<ValidatedSvcplusConfig, ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }
        self.metrics.validate()?;
        self.agent.validate()?;
        self.docker.validate()?;
        self.rabbitmq.validate()?;
        Ok(ValidatedSvcplusConfig { raw: self })
    }

    /// Copy with secrets replaced by a placeholder, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.rabbitmq.password = SecretString::new(svcplus_shared::REDACTED);
        copy
    }
}

/// Validated config wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSvcplusConfig {
    raw: SvcplusConfig,
}

impl ValidatedSvcplusConfig {
    /// Borrow the raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &SvcplusConfig {
        &self.raw
    }

    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> SvcplusConfig {
        self.raw
    }
}

impl AsRef<SvcplusConfig> for ValidatedSvcplusConfig {
    fn as_ref(&self) -> &SvcplusConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedSvcplusConfig {
    type Target = SvcplusConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Metric-config generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct MetricsConfig {
    /// Exporter mapping file, relative to the working directory.
    pub mapping_path: PathBuf,
    /// Dashboards directory, relative to the working directory.
    pub dashboards_dir: PathBuf,
    /// Encoding of written artifacts.
    pub output_encoding: TextEncoding,
    /// Exporter metric name for timer samples.
    pub metric_name: Box<str>,
    /// Exporter observer type.
    pub observer_type: ObserverType,
    /// Grafana datasource uid referenced by panels.
    pub datasource_uid: Box<str>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            mapping_path: PathBuf::from(DEFAULT_MAPPING_PATH),
            dashboards_dir: PathBuf::from(DEFAULT_DASHBOARDS_DIR),
            output_encoding: TextEncoding::Utf8,
            metric_name: DEFAULT_METRIC_NAME.into(),
            observer_type: ObserverType::Summary,
            datasource_uid: DEFAULT_DATASOURCE_UID.into(),
        }
    }
}

impl MetricsConfig {
    /// Mapping rendering options derived from this section.
    #[must_use]
    pub fn mapping_options(&self) -> MappingOptions {
        MappingOptions {
            metric_name: self.metric_name.to_string(),
            observer_type: self.observer_type,
        }
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        require_path("metrics", "mappingPath", &self.mapping_path)?;
        require_path("metrics", "dashboardsDir", &self.dashboards_dir)?;
        if !is_prometheus_metric_name(&self.metric_name) {
            return Err(ConfigSchemaError::InvalidMetricName {
                value: self.metric_name.to_string(),
            });
        }
        require_text("metrics", "datasourceUid", &self.datasource_uid)
    }
}

/// Project template settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct TemplatesConfig {
    /// Directory overriding the embedded templates (`<root>/<kind>/`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

/// Service-module manifest settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ModulesConfig {
    /// Manifest search root; the working directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

/// Middleware asset settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct AgentConfig {
    /// Directory the embedded middleware assets are written to.
    pub dir: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_AGENT_DIR),
        }
    }
}

impl AgentConfig {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        require_path("agent", "dir", &self.dir)
    }
}

/// Container tool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct DockerConfig {
    /// Tool binary name or path.
    pub binary: Box<str>,
    /// Bridge network for the metrics stack.
    pub network: Box<str>,
    /// Pause between container steps.
    pub step_delay_ms: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_DOCKER_BINARY.into(),
            network: DEFAULT_METRICS_NETWORK.into(),
            step_delay_ms: DEFAULT_STEP_DELAY_MS,
        }
    }
}

impl DockerConfig {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        require_text("docker", "binary", &self.binary)?;
        if !is_network_name(&self.network) {
            return Err(ConfigSchemaError::InvalidNetworkName {
                value: self.network.to_string(),
            });
        }
        if self.step_delay_ms > STEP_DELAY_MAX_MS {
            return Err(ConfigSchemaError::DelayOutOfRange {
                value_ms: self.step_delay_ms,
                max_ms: STEP_DELAY_MAX_MS,
            });
        }
        Ok(())
    }
}

/// Broker credentials passed to the compose invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct RabbitMqConfig {
    /// Broker user.
    pub user: Box<str>,
    /// Broker password.
    pub password: SecretString,
}

impl Default for RabbitMqConfig {
    fn default() -> Self {
        Self {
            user: DEFAULT_RABBITMQ_USER.into(),
            password: SecretString::new(DEFAULT_RABBITMQ_USER),
        }
    }
}

impl RabbitMqConfig {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        require_text("rabbitmq", "user", &self.user)?;
        require_text("rabbitmq", "password", self.password.expose())
    }
}

fn require_text(
    section: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ConfigSchemaError> {
    if value.trim().is_empty() {
        return Err(ConfigSchemaError::EmptyField { section, field });
    }
    Ok(())
}

fn require_path(
    section: &'static str,
    field: &'static str,
    value: &std::path::Path,
) -> Result<(), ConfigSchemaError> {
    if value.as_os_str().is_empty() {
        return Err(ConfigSchemaError::EmptyField { section, field });
    }
    Ok(())
}

fn is_prometheus_metric_name(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == ':')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == ':')
}

fn is_network_name(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphanumeric()
        && chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-'))
}

/// Config validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// A required field is empty.
    EmptyField {
        /// Schema section (e.g. `docker`).
        section: &'static str,
        /// Field name in the config file (e.g. `binary`).
        field: &'static str,
    },
    /// `metrics.metricName` is not a valid exporter metric name.
    InvalidMetricName {
        /// Value provided.
        value: String,
    },
    /// `docker.network` is not a valid network name.
    InvalidNetworkName {
        /// Value provided.
        value: String,
    },
    /// `docker.stepDelayMs` is out of range.
    DelayOutOfRange {
        /// Value provided (ms).
        value_ms: u64,
        /// Maximum allowed value (ms).
        max_ms: u64,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::EmptyField { .. } => ErrorCode::new("config", "empty_field"),
            Self::InvalidMetricName { .. } => ErrorCode::new("config", "invalid_metric_name"),
            Self::InvalidNetworkName { .. } => ErrorCode::new("config", "invalid_network_name"),
            Self::DelayOutOfRange { .. } => ErrorCode::new("config", "delay_out_of_range"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => write!(
                formatter,
                "unsupported config version {found} (supported: {supported})"
            ),
            Self::EmptyField { section, field } => {
                write!(formatter, "{section}.{field} must be non-empty")
            },
            Self::InvalidMetricName { .. } => formatter
                .write_str("metrics.metricName must match /^[a-zA-Z_:][a-zA-Z0-9_:]*$/"),
            Self::InvalidNetworkName { .. } => formatter
                .write_str("docker.network must match /^[a-zA-Z0-9][a-zA-Z0-9_.-]*$/"),
            Self::DelayOutOfRange { max_ms, .. } => {
                write!(formatter, "docker.stepDelayMs must be <= {max_ms}")
            },
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            ConfigSchemaError::EmptyField { section, field } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field),
            ConfigSchemaError::InvalidMetricName { value }
            | ConfigSchemaError::InvalidNetworkName { value } => {
                envelope.with_metadata("value", value)
            },
            ConfigSchemaError::DelayOutOfRange { value_ms, max_ms } => envelope
                .with_metadata("value_ms", value_ms.to_string())
                .with_metadata("max_ms", max_ms.to_string()),
        }
    }
}

/// Parse and validate a TOML config document.
pub fn parse_config_toml(input: &str) -> Result<ValidatedSvcplusConfig, ErrorEnvelope> {
    let config: SvcplusConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;
    config.validate().map_err(Into::into)
}

/// Parse and validate a JSON config document.
pub fn parse_config_json(input: &str) -> Result<ValidatedSvcplusConfig, ErrorEnvelope> {
    let config: SvcplusConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;
    config.validate().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() -> Result<(), ConfigSchemaError> {
        let config = SvcplusConfig::default().validate()?;
        assert_eq!(config.metrics.mapping_path, PathBuf::from("statsd_mapping.yml"));
        assert_eq!(config.docker.step_delay_ms, 500);
        assert_eq!(&*config.docker.network, "metric_servers");
        Ok(())
    }

    #[test]
    fn rejects_bad_metric_name() {
        let mut config = SvcplusConfig::default();
        config.metrics.metric_name = "service-duration".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigSchemaError::InvalidMetricName { .. })
        ));
    }

    #[test]
    fn rejects_excessive_delay() {
        let mut config = SvcplusConfig::default();
        config.docker.step_delay_ms = 120_000;
        let Err(error) = config.validate() else {
            return;
        };
        let envelope: ErrorEnvelope = error.into();
        assert_eq!(envelope.code, ErrorCode::new("config", "delay_out_of_range"));
        assert_eq!(
            envelope.metadata.get("max_ms").map(String::as_str),
            Some("60000")
        );
    }

    #[test]
    fn rejects_unknown_fields() {
        let result = parse_config_toml("[metrics]\nmappingFile = \"x.yml\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn parses_partial_toml_over_defaults() -> Result<(), ErrorEnvelope> {
        let config = parse_config_toml(
            "[metrics]\noutputEncoding = \"ascii\"\nobserverType = \"histogram\"\n\n[docker]\nstepDelayMs = 0\n",
        )?;
        assert_eq!(config.metrics.output_encoding, TextEncoding::Ascii);
        assert_eq!(config.metrics.observer_type, ObserverType::Histogram);
        assert_eq!(config.docker.step_delay_ms, 0);
        assert_eq!(&*config.docker.binary, "docker");
        Ok(())
    }

    #[test]
    fn redacted_hides_password() {
        let config = SvcplusConfig::default().redacted();
        assert_eq!(config.rabbitmq.password.expose(), svcplus_shared::REDACTED);
    }
}
