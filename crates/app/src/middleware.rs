//! Middleware lifecycle: rabbitmq through compose, the metrics stack through
//! individual containers on a bridge network.

use crate::progress::{Progress, ProgressSink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use svcplus_domain::{
    BrokerCredentials, ComposeRequest, EMPTY_MAPPING_YAML, MetricsLayout, Middleware,
    MiddlewareStep, TemplateSet, metrics_start_plan, metrics_stop_plan, rabbitmq_compose_dir,
};
use svcplus_ports::{
    ArtifactWriterPort, ContainerId, ContainerRuntimePort, DirState, SafeRelativePath,
    TemplateStorePort,
};
use svcplus_shared::Result;

/// Start or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiddlewareAction {
    /// Bring the middleware up.
    Start,
    /// Tear the middleware down.
    Stop,
}

impl MiddlewareAction {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

/// Dependencies required by the middleware controller.
#[derive(Clone)]
pub struct MiddlewareDeps {
    /// Container runtime.
    pub runtime: Arc<dyn ContainerRuntimePort>,
    /// Source of the agent assets.
    pub agent_templates: Arc<dyn TemplateStorePort>,
    /// Artifact writer used to materialize the agent assets.
    pub writer: Arc<dyn ArtifactWriterPort>,
}

/// Input payload for a middleware run.
#[derive(Clone)]
pub struct MiddlewareInput {
    /// Target middleware.
    pub middleware: Middleware,
    /// Agent assets directory (absolute).
    pub agent_dir: PathBuf,
    /// Exporter mapping file (absolute).
    pub mapping_path: PathBuf,
    /// Dashboards directory (absolute).
    pub dashboards_dir: PathBuf,
    /// Metrics bridge network name.
    pub network: Box<str>,
    /// Broker credentials for compose requests.
    pub credentials: Option<BrokerCredentials>,
    /// Pause between consecutive steps.
    pub step_delay: Duration,
    /// Optional progress callback.
    pub on_progress: Option<ProgressSink>,
}

/// One completed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Status line of the step.
    pub label: String,
    /// Container started by the step.
    pub container: Option<ContainerId>,
}

/// Result of a middleware run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiddlewareOutput {
    /// Target middleware.
    pub middleware: Middleware,
    /// Performed action.
    pub action: MiddlewareAction,
    /// Completed steps, in order.
    pub steps: Vec<StepReport>,
}

/// Start `input.middleware`.
pub fn start_middleware(deps: &MiddlewareDeps, input: MiddlewareInput) -> Result<MiddlewareOutput> {
    run_middleware(deps, MiddlewareAction::Start, input)
}

/// Stop `input.middleware`.
pub fn stop_middleware(deps: &MiddlewareDeps, input: MiddlewareInput) -> Result<MiddlewareOutput> {
    run_middleware(deps, MiddlewareAction::Stop, input)
}

/// Check the runtime, materialize the agent assets and execute the plan.
///
/// The first failing step aborts the run.
pub fn run_middleware(
    deps: &MiddlewareDeps,
    action: MiddlewareAction,
    input: MiddlewareInput,
) -> Result<MiddlewareOutput> {
    deps.runtime.check_available()?;

    let progress = Progress::new(input.on_progress.clone());
    let assets = materialize_agent_assets(deps, &input.agent_dir)?;
    let plan = build_plan(deps.writer.as_ref(), &progress, action, &input, &assets)?;

    tracing::info!(
        middleware = input.middleware.as_str(),
        action = action.as_str(),
        steps = plan.len(),
        "executing middleware plan"
    );
    let steps = execute_plan(deps.runtime.as_ref(), &progress, &plan, input.step_delay)?;
    Ok(MiddlewareOutput {
        middleware: input.middleware,
        action,
        steps,
    })
}

/// Write the agent assets under `agent_dir`, returning their relative paths.
fn materialize_agent_assets(
    deps: &MiddlewareDeps,
    agent_dir: &Path,
) -> Result<Vec<SafeRelativePath>> {
    let files = deps.agent_templates.template_files(TemplateSet::Agent)?;
    let mut written = Vec::with_capacity(files.len());
    for file in &files {
        let relative = SafeRelativePath::new(&file.relative_path)?;
        let target = join_relative(agent_dir, &relative);
        deps.writer.write_bytes(&target, &file.contents)?;
        written.push(relative);
    }
    tracing::debug!(
        agent_dir = %agent_dir.display(),
        files = written.len(),
        "materialized agent assets"
    );
    Ok(written)
}

fn build_plan(
    writer: &dyn ArtifactWriterPort,
    progress: &Progress,
    action: MiddlewareAction,
    input: &MiddlewareInput,
    assets: &[SafeRelativePath],
) -> Result<Vec<MiddlewareStep>> {
    match (input.middleware, action) {
        (Middleware::RabbitMq, _) => {
            let compose_dir = rabbitmq_compose_dir(&input.agent_dir);
            let requests = assets
                .iter()
                .filter(|asset| is_compose_file(asset))
                .map(|asset| ComposeRequest {
                    file: join_relative(&input.agent_dir, asset),
                    credentials: input.credentials.clone(),
                })
                .filter(|request| request.file.starts_with(&compose_dir));
            Ok(match action {
                MiddlewareAction::Start => requests.map(MiddlewareStep::ComposeUp).collect(),
                MiddlewareAction::Stop => requests.map(MiddlewareStep::ComposeDown).collect(),
            })
        },
        (Middleware::Metrics, MiddlewareAction::Start) => {
            // Docker bind-mounts this path and would create a directory in its place.
            if writer.dir_state(&input.mapping_path)? == DirState::Missing {
                writer.write_bytes(&input.mapping_path, EMPTY_MAPPING_YAML.as_bytes())?;
                tracing::warn!(
                    path = %input.mapping_path.display(),
                    "mapping file is missing; wrote an empty one, run metric-config-gen"
                );
                progress.detail(format!(
                    "{} is missing; the exporter starts without mappings",
                    input.mapping_path.display()
                ));
            }
            if writer.dir_state(&input.dashboards_dir)? == DirState::Missing {
                writer.create_dir_all(&input.dashboards_dir)?;
            }
            Ok(metrics_start_plan(&MetricsLayout {
                agent_dir: input.agent_dir.clone(),
                mapping_path: input.mapping_path.clone(),
                dashboards_dir: input.dashboards_dir.clone(),
                network: input.network.clone(),
            }))
        },
        (Middleware::Metrics, MiddlewareAction::Stop) => Ok(metrics_stop_plan(&input.network)),
    }
}

fn execute_plan(
    runtime: &dyn ContainerRuntimePort,
    progress: &Progress,
    plan: &[MiddlewareStep],
    delay: Duration,
) -> Result<Vec<StepReport>> {
    let mut reports = Vec::with_capacity(plan.len());
    for (index, step) in plan.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let label = step.describe();
        let container = progress.step(&label, || execute_step(runtime, progress, step))?;
        tracing::info!(step = %label, "middleware step finished");
        reports.push(StepReport { label, container });
    }
    Ok(reports)
}

fn execute_step(
    runtime: &dyn ContainerRuntimePort,
    progress: &Progress,
    step: &MiddlewareStep,
) -> Result<Option<ContainerId>> {
    match step {
        MiddlewareStep::CreateNetwork { name } => runtime.create_network(name).map(|()| None),
        MiddlewareStep::RemoveNetwork { name } => runtime.remove_network(name).map(|()| None),
        MiddlewareStep::RunContainer(spec) => {
            let id = runtime.run_container(spec)?;
            progress.detail(format!("Container ID: {id}"));
            Ok(Some(id))
        },
        MiddlewareStep::RemoveContainer { name, .. } => {
            runtime.remove_container(name)?;
            progress.detail("Container is removed.");
            Ok(None)
        },
        MiddlewareStep::ComposeUp(request) => runtime.compose_up(request).map(|()| None),
        MiddlewareStep::ComposeDown(request) => runtime.compose_down(request).map(|()| None),
    }
}

fn is_compose_file(path: &SafeRelativePath) -> bool {
    let name = path.as_str();
    name.ends_with(".yml") || name.ends_with(".yaml")
}

fn join_relative(root: &Path, relative: &SafeRelativePath) -> PathBuf {
    relative
        .segments()
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressEvent;
    use std::sync::Mutex;
    use svcplus_domain::TemplateFile;
    use svcplus_shared::{ErrorCode, ErrorEnvelope, SecretString};

    #[derive(Default)]
    struct RecordingRuntime {
        calls: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
        unavailable: bool,
    }

    impl RecordingRuntime {
        fn record(&self, call: String) -> Result<()> {
            let failing = self.fail_on.is_some_and(|needle| call.contains(needle));
            self.calls
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(call);
            if failing {
                return Err(ErrorEnvelope::expected(
                    ErrorCode::new("container", "command_failed"),
                    "boom",
                ));
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone()
        }
    }

    impl ContainerRuntimePort for RecordingRuntime {
        fn check_available(&self) -> Result<()> {
            if self.unavailable {
                return Err(ErrorEnvelope::expected(
                    ErrorCode::new("container", "tool_missing"),
                    "Please install docker first",
                ));
            }
            Ok(())
        }

        fn compose_up(&self, request: &ComposeRequest) -> Result<()> {
            let user = request
                .credentials
                .as_ref()
                .map_or("-", |credentials| &*credentials.user);
            self.record(format!("up {} as {user}", request.file.display()))
        }

        fn compose_down(&self, request: &ComposeRequest) -> Result<()> {
            self.record(format!("down {}", request.file.display()))
        }

        fn run_container(&self, spec: &svcplus_domain::ContainerSpec) -> Result<ContainerId> {
            self.record(format!("run {}", spec.name))?;
            Ok(ContainerId::new(&format!("id-{}\n", spec.name)))
        }

        fn remove_container(&self, name: &str) -> Result<()> {
            self.record(format!("rm {name}"))
        }

        fn create_network(&self, name: &str) -> Result<()> {
            self.record(format!("network create {name}"))
        }

        fn remove_network(&self, name: &str) -> Result<()> {
            self.record(format!("network rm {name}"))
        }
    }

    #[derive(Default)]
    struct MemoryWriter {
        files: Mutex<Vec<PathBuf>>,
        dirs: Mutex<Vec<PathBuf>>,
    }

    impl ArtifactWriterPort for MemoryWriter {
        fn dir_state(&self, path: &Path) -> Result<DirState> {
            let dirs = self
                .dirs
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            Ok(if dirs.iter().any(|dir| dir == path) {
                DirState::Empty
            } else {
                DirState::Missing
            })
        }

        fn create_dir_all(&self, path: &Path) -> Result<()> {
            self.dirs
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(path.to_path_buf());
            Ok(())
        }

        fn write_bytes(&self, path: &Path, _contents: &[u8]) -> Result<()> {
            self.files
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(path.to_path_buf());
            Ok(())
        }
    }

    struct AgentAssets;

    impl TemplateStorePort for AgentAssets {
        fn template_files(&self, _set: TemplateSet) -> Result<Vec<TemplateFile>> {
            Ok(vec![
                TemplateFile::text("prometheus/prometheus.yml", ""),
                TemplateFile::text("rabbitmq/docker-compose.yml", ""),
                TemplateFile::text("statsd/config.js", ""),
            ])
        }

        fn describe(&self) -> String {
            "agent".to_owned()
        }
    }

    fn deps(runtime: &Arc<RecordingRuntime>, writer: &Arc<MemoryWriter>) -> MiddlewareDeps {
        MiddlewareDeps {
            runtime: Arc::clone(runtime) as Arc<dyn ContainerRuntimePort>,
            agent_templates: Arc::new(AgentAssets),
            writer: Arc::clone(writer) as Arc<dyn ArtifactWriterPort>,
        }
    }

    fn input(middleware: Middleware, on_progress: Option<ProgressSink>) -> MiddlewareInput {
        MiddlewareInput {
            middleware,
            agent_dir: PathBuf::from("/work/.svcplus/agent"),
            mapping_path: PathBuf::from("/work/statsd_mapping.yml"),
            dashboards_dir: PathBuf::from("/work/grafana_dashboards"),
            network: "metric_servers".into(),
            credentials: Some(BrokerCredentials {
                user: "svc".into(),
                password: SecretString::new("pw"),
            }),
            step_delay: Duration::ZERO,
            on_progress,
        }
    }

    #[test]
    fn metrics_start_runs_network_then_containers() -> Result<()> {
        let runtime = Arc::new(RecordingRuntime::default());
        let writer = Arc::new(MemoryWriter::default());
        let output = start_middleware(&deps(&runtime, &writer), input(Middleware::Metrics, None))?;

        assert_eq!(
            runtime.calls(),
            vec![
                "network create metric_servers",
                "run prometheus",
                "run statsd-exporter",
                "run statsd-agent",
                "run grafana",
            ]
        );
        assert_eq!(
            output
                .steps
                .get(1)
                .and_then(|step| step.container.as_ref())
                .map(ContainerId::as_str),
            Some("id-prometheus")
        );
        let files = writer
            .files
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        assert!(files.contains(&PathBuf::from("/work/.svcplus/agent/statsd/config.js")));
        assert!(files.contains(&PathBuf::from("/work/statsd_mapping.yml")));
        let dirs = writer
            .dirs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        assert_eq!(dirs, vec![PathBuf::from("/work/grafana_dashboards")]);
        Ok(())
    }

    #[test]
    fn metrics_stop_removes_containers_then_network() -> Result<()> {
        let runtime = Arc::new(RecordingRuntime::default());
        let writer = Arc::new(MemoryWriter::default());
        stop_middleware(&deps(&runtime, &writer), input(Middleware::Metrics, None))?;
        assert_eq!(
            runtime.calls(),
            vec![
                "rm statsd-agent",
                "rm statsd-exporter",
                "rm prometheus",
                "rm grafana",
                "network rm metric_servers",
            ]
        );
        Ok(())
    }

    #[test]
    fn rabbitmq_compose_receives_request_credentials() -> Result<()> {
        let runtime = Arc::new(RecordingRuntime::default());
        let writer = Arc::new(MemoryWriter::default());
        start_middleware(&deps(&runtime, &writer), input(Middleware::RabbitMq, None))?;
        stop_middleware(&deps(&runtime, &writer), input(Middleware::RabbitMq, None))?;
        assert_eq!(
            runtime.calls(),
            vec![
                "up /work/.svcplus/agent/rabbitmq/docker-compose.yml as svc",
                "down /work/.svcplus/agent/rabbitmq/docker-compose.yml",
            ]
        );
        Ok(())
    }

    #[test]
    fn first_failing_step_aborts() {
        let runtime = Arc::new(RecordingRuntime {
            fail_on: Some("statsd-exporter"),
            ..RecordingRuntime::default()
        });
        let writer = Arc::new(MemoryWriter::default());
        let result = start_middleware(&deps(&runtime, &writer), input(Middleware::Metrics, None));
        assert!(result.is_err());
        assert_eq!(
            runtime.calls(),
            vec![
                "network create metric_servers",
                "run prometheus",
                "run statsd-exporter",
            ]
        );
    }

    #[test]
    fn unavailable_runtime_stops_before_any_write() {
        let runtime = Arc::new(RecordingRuntime {
            unavailable: true,
            ..RecordingRuntime::default()
        });
        let writer = Arc::new(MemoryWriter::default());
        let result = start_middleware(&deps(&runtime, &writer), input(Middleware::Metrics, None));
        assert_eq!(
            result.err().map(|error| error.code),
            Some(ErrorCode::new("container", "tool_missing"))
        );
        assert!(
            writer
                .files
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .is_empty()
        );
    }

    #[test]
    fn container_steps_report_details() -> Result<()> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&events);
        let sink: ProgressSink = Arc::new(move |event| {
            captured
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(event);
        });
        let runtime = Arc::new(RecordingRuntime::default());
        let writer = Arc::new(MemoryWriter::default());
        stop_middleware(
            &deps(&runtime, &writer),
            input(Middleware::Metrics, Some(sink)),
        )?;

        let events = events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        assert_eq!(
            events.first(),
            Some(&ProgressEvent::StepStarted {
                label: "Stopping statsd agent".into()
            })
        );
        assert!(events.contains(&ProgressEvent::Detail {
            message: "Container is removed.".into()
        }));
        Ok(())
    }
}
