//! Middleware lifecycle plans.
//!
//! A plan is the ordered list of container-tool steps for starting or
//! stopping one middleware. Plans are pure data; executing them is the job
//! of the container runtime port.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use svcplus_shared::SecretString;

use crate::scaffold::UnknownKind;

/// Default bridge network for the metrics stack.
pub const DEFAULT_METRICS_NETWORK: &str = "metric_servers";

/// Middleware managed by `start` / `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Middleware {
    /// Message broker via compose files.
    RabbitMq,
    /// Statsd agent, exporter, prometheus and grafana.
    Metrics,
}

impl Middleware {
    /// Every middleware, in help order.
    pub const ALL: [Self; 2] = [Self::RabbitMq, Self::Metrics];

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RabbitMq => "rabbitmq",
            Self::Metrics => "metrics",
        }
    }
}

impl fmt::Display for Middleware {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Middleware {
    type Err = UnknownKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value.trim())
            .ok_or_else(|| UnknownKind {
                input: value.to_owned(),
                expected: Self::ALL.map(Self::as_str).join(", "),
            })
    }
}

/// Published port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    /// Host port.
    pub host: u16,
    /// Container port.
    pub container: u16,
    /// UDP instead of TCP.
    pub udp: bool,
}

impl PortMapping {
    /// TCP publication.
    #[must_use]
    pub const fn tcp(host: u16, container: u16) -> Self {
        Self {
            host,
            container,
            udp: false,
        }
    }

    /// UDP publication.
    #[must_use]
    pub const fn udp(host: u16, container: u16) -> Self {
        Self {
            host,
            container,
            udp: true,
        }
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.host, self.container)?;
        if self.udp {
            formatter.write_str("/udp")?;
        }
        Ok(())
    }
}

/// Bind mount, always read-write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    /// Host path.
    pub host: PathBuf,
    /// Mount point inside the container.
    pub container: Box<str>,
}

impl VolumeMount {
    /// Build a mount.
    pub fn new(host: impl Into<PathBuf>, container: impl Into<Box<str>>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
        }
    }
}

/// Container to run detached with `restart=always`, interactive tty, and
/// images pulled only when missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Container name, also used as hostname.
    pub name: Box<str>,
    /// Image reference.
    pub image: Box<str>,
    /// Published ports.
    pub ports: Vec<PortMapping>,
    /// Bind mounts.
    pub volumes: Vec<VolumeMount>,
    /// Networks to join.
    pub networks: Vec<Box<str>>,
    /// Arguments passed to the image entrypoint.
    pub command: Vec<Box<str>>,
}

/// Broker credentials handed to a single compose invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerCredentials {
    /// Broker user.
    pub user: Box<str>,
    /// Broker password.
    pub password: SecretString,
}

/// Compose request for one compose file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeRequest {
    /// Compose file path.
    pub file: PathBuf,
    /// Credentials exported to the compose child process only.
    pub credentials: Option<BrokerCredentials>,
}

/// One step of a middleware plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiddlewareStep {
    /// Create a bridge network.
    CreateNetwork {
        /// Network name.
        name: Box<str>,
    },
    /// Remove a network.
    RemoveNetwork {
        /// Network name.
        name: Box<str>,
    },
    /// Run a container.
    RunContainer(ContainerSpec),
    /// Force-remove a container.
    RemoveContainer {
        /// Container name.
        name: Box<str>,
        /// Human-readable service label.
        label: Box<str>,
    },
    /// `compose up -d`.
    ComposeUp(ComposeRequest),
    /// `compose down`.
    ComposeDown(ComposeRequest),
}

impl MiddlewareStep {
    /// Status line shown while the step runs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::CreateNetwork { name } => format!("Starting network {name}"),
            Self::RemoveNetwork { name } => format!("Stopping network {name}"),
            Self::RunContainer(spec) => format!("Starting {}", label_for(&spec.name)),
            Self::RemoveContainer { label, .. } => format!("Stopping {label}"),
            Self::ComposeUp(_) => "Starting rabbitmq".to_owned(),
            Self::ComposeDown(_) => "Stopping rabbitmq".to_owned(),
        }
    }
}

/// Host-side paths mounted into the metrics stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsLayout {
    /// Materialized agent assets root.
    pub agent_dir: PathBuf,
    /// Exporter mapping file.
    pub mapping_path: PathBuf,
    /// Generated dashboards directory.
    pub dashboards_dir: PathBuf,
    /// Bridge network name.
    pub network: Box<str>,
}

impl MetricsLayout {
    /// Statsd agent config path.
    #[must_use]
    pub fn statsd_config(&self) -> PathBuf {
        self.agent_dir.join("statsd").join("config.js")
    }

    /// Prometheus config path.
    #[must_use]
    pub fn prometheus_config(&self) -> PathBuf {
        self.agent_dir.join("prometheus").join("prometheus.yml")
    }

    /// Grafana provisioning directory.
    #[must_use]
    pub fn grafana_provisioning(&self) -> PathBuf {
        self.agent_dir.join("grafana").join("provisioning")
    }

    /// Grafana ini path.
    #[must_use]
    pub fn grafana_ini(&self) -> PathBuf {
        self.agent_dir.join("grafana").join("grafana.ini")
    }
}

/// Rabbitmq compose directory under an agent root.
#[must_use]
pub fn rabbitmq_compose_dir(agent_dir: &Path) -> PathBuf {
    agent_dir.join("rabbitmq")
}

const PROMETHEUS: &str = "prometheus";
const STATSD_EXPORTER: &str = "statsd-exporter";
const STATSD_AGENT: &str = "statsd-agent";
const GRAFANA: &str = "grafana";

fn label_for(name: &str) -> &str {
    match name {
        STATSD_EXPORTER => "statsd exporter",
        STATSD_AGENT => "statsd agent",
        other => other,
    }
}

/// Ordered steps bringing the metrics stack up.
#[must_use]
pub fn metrics_start_plan(layout: &MetricsLayout) -> Vec<MiddlewareStep> {
    let networks = vec![layout.network.clone()];
    let container = |name: &str, image: &str| ContainerSpec {
        name: name.into(),
        image: image.into(),
        ports: Vec::new(),
        volumes: Vec::new(),
        networks: networks.clone(),
        command: Vec::new(),
    };

    let prometheus = ContainerSpec {
        ports: vec![PortMapping::tcp(9193, 9090)],
        volumes: vec![VolumeMount::new(
            layout.prometheus_config(),
            "/etc/prometheus/prometheus.yml",
        )],
        ..container(PROMETHEUS, "prom/prometheus:latest")
    };
    let exporter = ContainerSpec {
        ports: vec![PortMapping::udp(9125, 9125), PortMapping::tcp(9102, 9102)],
        volumes: vec![VolumeMount::new(
            layout.mapping_path.clone(),
            "/tmp/statsd_mapping.yml",
        )],
        command: vec!["--statsd.mapping-config=/tmp/statsd_mapping.yml".into()],
        ..container(STATSD_EXPORTER, "prom/statsd-exporter:latest")
    };
    let agent = ContainerSpec {
        ports: vec![PortMapping::udp(8125, 8125), PortMapping::tcp(8126, 8126)],
        volumes: vec![VolumeMount::new(
            layout.statsd_config(),
            "/usr/src/app/config.js",
        )],
        ..container(STATSD_AGENT, "statsd/statsd:latest")
    };
    let grafana = ContainerSpec {
        ports: vec![PortMapping::tcp(3100, 3000)],
        volumes: vec![
            VolumeMount::new(layout.grafana_provisioning(), "/etc/grafana/provisioning"),
            VolumeMount::new(layout.grafana_ini(), "/etc/grafana/grafana.ini"),
            VolumeMount::new(layout.dashboards_dir.clone(), "/var/lib/grafana/dashboards"),
        ],
        ..container(GRAFANA, "grafana/grafana:latest")
    };

    vec![
        MiddlewareStep::CreateNetwork {
            name: layout.network.clone(),
        },
        MiddlewareStep::RunContainer(prometheus),
        MiddlewareStep::RunContainer(exporter),
        MiddlewareStep::RunContainer(agent),
        MiddlewareStep::RunContainer(grafana),
    ]
}

/// Ordered steps tearing the metrics stack down.
#[must_use]
pub fn metrics_stop_plan(network: &str) -> Vec<MiddlewareStep> {
    let remove = |name: &str| MiddlewareStep::RemoveContainer {
        name: name.into(),
        label: label_for(name).into(),
    };
    vec![
        remove(STATSD_AGENT),
        remove(STATSD_EXPORTER),
        remove(PROMETHEUS),
        remove(GRAFANA),
        MiddlewareStep::RemoveNetwork {
            name: network.into(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> MetricsLayout {
        MetricsLayout {
            agent_dir: PathBuf::from("/work/.svcplus/agent"),
            mapping_path: PathBuf::from("/work/statsd_mapping.yml"),
            dashboards_dir: PathBuf::from("/work/grafana_dashboards"),
            network: DEFAULT_METRICS_NETWORK.into(),
        }
    }

    fn container_names(steps: &[MiddlewareStep]) -> Vec<&str> {
        steps
            .iter()
            .filter_map(|step| match step {
                MiddlewareStep::RunContainer(spec) => Some(&*spec.name),
                MiddlewareStep::RemoveContainer { name, .. } => Some(&**name),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn start_plan_creates_network_first() {
        let steps = metrics_start_plan(&layout());
        assert_eq!(
            steps.first(),
            Some(&MiddlewareStep::CreateNetwork {
                name: "metric_servers".into()
            })
        );
        assert_eq!(
            container_names(&steps),
            ["prometheus", "statsd-exporter", "statsd-agent", "grafana"]
        );
    }

    #[test]
    fn stop_plan_removes_network_last() {
        let steps = metrics_stop_plan("metric_servers");
        assert_eq!(
            container_names(&steps),
            ["statsd-agent", "statsd-exporter", "prometheus", "grafana"]
        );
        assert!(matches!(
            steps.last(),
            Some(MiddlewareStep::RemoveNetwork { .. })
        ));
    }

    #[test]
    fn exporter_mounts_mapping_file() {
        let steps = metrics_start_plan(&layout());
        let exporter = steps.iter().find_map(|step| match step {
            MiddlewareStep::RunContainer(spec) if &*spec.name == "statsd-exporter" => Some(spec),
            _ => None,
        });
        let Some(exporter) = exporter else {
            return;
        };
        assert_eq!(
            exporter.volumes.first().map(|v| v.host.as_path()),
            Some(Path::new("/work/statsd_mapping.yml"))
        );
        assert_eq!(
            exporter.ports.iter().map(ToString::to_string).collect::<Vec<_>>(),
            ["9125:9125/udp", "9102:9102"]
        );
    }

    #[test]
    fn step_descriptions_match_status_lines() {
        let steps = metrics_stop_plan("metric_servers");
        let lines: Vec<_> = steps.iter().map(MiddlewareStep::describe).collect();
        assert_eq!(
            lines,
            [
                "Stopping statsd agent",
                "Stopping statsd exporter",
                "Stopping prometheus",
                "Stopping grafana",
                "Stopping network metric_servers",
            ]
        );
    }

    #[test]
    fn middleware_parses_names() -> Result<(), UnknownKind> {
        assert_eq!("rabbitmq".parse::<Middleware>()?, Middleware::RabbitMq);
        assert!("redis".parse::<Middleware>().is_err());
        Ok(())
    }
}
