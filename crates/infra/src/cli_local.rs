//! Local CLI orchestration helpers.

use crate::adapter_factory::{
    build_agent_templates, build_artifact_writer, build_container_runtime,
    build_document_renderer, build_module_resolver, build_project_templates, resolve_path,
};
use crate::{EffectiveConfig, InfraResult, load_effective_config};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use svcplus_app::{
    GenerateTestsInput, InitProjectInput, MetricConfigDeps, MetricConfigInput,
    MetricConfigOutput, MiddlewareAction, MiddlewareDeps, MiddlewareInput, MiddlewareOutput,
    ProgressSink, ScaffoldDeps, ScaffoldOutput, generate_metric_config, generate_tests,
    init_project, parse_class_list, run_middleware,
};
use svcplus_config::{ValidatedSvcplusConfig, collect_scoped_env};
use svcplus_domain::{BrokerCredentials, Middleware, ModuleId, ProjectKind, TestKind};
use svcplus_shared::ErrorEnvelope;

/// Working directory plus the effective config for one CLI invocation.
#[derive(Debug, Clone)]
pub struct LocalContext {
    working_dir: PathBuf,
    effective: EffectiveConfig,
}

impl LocalContext {
    /// Load the config from the process env and the config files.
    pub fn load(working_dir: &Path, config_path: Option<&Path>) -> InfraResult<Self> {
        Self::from_env_map(&collect_scoped_env(), working_dir, config_path)
    }

    /// Load the config from an explicit env map.
    pub fn from_env_map(
        env: &BTreeMap<String, String>,
        working_dir: &Path,
        config_path: Option<&Path>,
    ) -> InfraResult<Self> {
        let working_dir = std::path::absolute(working_dir)
            .map_err(|error| svcplus_shared::io_error_at(working_dir, error))?;
        let effective = load_effective_config(env, config_path, &working_dir)?;
        Ok(Self {
            working_dir,
            effective,
        })
    }

    /// Absolute working directory.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Effective config.
    #[must_use]
    pub const fn config(&self) -> &ValidatedSvcplusConfig {
        &self.effective.config
    }

    /// Config file in use, if any.
    #[must_use]
    pub fn config_source(&self) -> Option<&Path> {
        self.effective.source.as_deref()
    }

    /// `path` made absolute against the working directory.
    #[must_use]
    pub fn absolute(&self, path: &Path) -> PathBuf {
        resolve_path(&self.working_dir, path)
    }
}

/// Summary printed by `info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoSummary {
    /// `name version (hash)`.
    pub version: String,
    /// `<arch>-<os>`.
    pub platform: String,
    /// Build profile.
    pub profile: &'static str,
    /// Config file in use.
    pub config_source: Option<PathBuf>,
    /// Project template origin.
    pub templates: String,
    /// Service-module manifests root.
    pub modules_root: PathBuf,
    /// Agent assets directory.
    pub agent_dir: PathBuf,
    /// Mapping file destination.
    pub mapping_path: PathBuf,
    /// Dashboards directory.
    pub dashboards_dir: PathBuf,
    /// Container tool binary.
    pub docker_binary: String,
    /// Metrics network name.
    pub network: String,
}

/// Collect the `info` summary.
#[must_use]
pub fn read_info_local(ctx: &LocalContext) -> InfoSummary {
    let build = svcplus_core::build_info();
    let config = ctx.config();
    InfoSummary {
        version: build.version_string(),
        platform: build.platform(),
        profile: build.profile,
        config_source: ctx.config_source().map(Path::to_path_buf),
        templates: build_project_templates(config, ctx.working_dir()).describe(),
        modules_root: svcplus_adapters::manifest_root_or(
            config.modules.root.as_deref(),
            ctx.working_dir(),
        ),
        agent_dir: ctx.absolute(&config.agent.dir),
        mapping_path: ctx.absolute(&config.metrics.mapping_path),
        dashboards_dir: ctx.absolute(&config.metrics.dashboards_dir),
        docker_binary: config.docker.binary.to_string(),
        network: config.docker.network.to_string(),
    }
}

/// Create a project skeleton.
pub fn run_init_local(
    ctx: &LocalContext,
    directory: &Path,
    kind: ProjectKind,
    on_progress: Option<ProgressSink>,
) -> InfraResult<ScaffoldOutput> {
    init_project(
        &scaffold_deps(ctx),
        InitProjectInput {
            directory: ctx.absolute(directory),
            kind,
            on_progress,
        },
    )
}

/// Add test skeleton files to an existing project.
pub fn run_test_gen_local(
    ctx: &LocalContext,
    directory: &Path,
    kind: TestKind,
    on_progress: Option<ProgressSink>,
) -> InfraResult<ScaffoldOutput> {
    generate_tests(
        &scaffold_deps(ctx),
        GenerateTestsInput {
            directory: ctx.absolute(directory),
            kind,
            on_progress,
        },
    )
}

/// Generate the mapping file and dashboards for `classes` of `module`.
pub fn run_metric_config_local(
    ctx: &LocalContext,
    module: &str,
    classes: &str,
    on_progress: Option<ProgressSink>,
) -> InfraResult<MetricConfigOutput> {
    let config = ctx.config();
    let module = ModuleId::parse(module).map_err(ErrorEnvelope::from)?;
    let classes = parse_class_list(classes)?;
    let deps = MetricConfigDeps {
        resolver: build_module_resolver(config, ctx.working_dir()),
        renderer: build_document_renderer(config),
        writer: build_artifact_writer(),
        uid_source: None,
    };
    generate_metric_config(
        &deps,
        MetricConfigInput {
            module,
            classes,
            mapping_path: ctx.absolute(&config.metrics.mapping_path),
            dashboards_dir: ctx.absolute(&config.metrics.dashboards_dir),
            mapping_options: config.metrics.mapping_options(),
            encoding: config.metrics.output_encoding,
            on_progress,
        },
    )
}

/// Start or stop a middleware.
pub fn run_middleware_local(
    ctx: &LocalContext,
    middleware: Middleware,
    action: MiddlewareAction,
    on_progress: Option<ProgressSink>,
) -> InfraResult<MiddlewareOutput> {
    let config = ctx.config();
    let deps = MiddlewareDeps {
        runtime: build_container_runtime(config),
        agent_templates: build_agent_templates(),
        writer: build_artifact_writer(),
    };
    run_middleware(
        &deps,
        action,
        MiddlewareInput {
            middleware,
            agent_dir: ctx.absolute(&config.agent.dir),
            mapping_path: ctx.absolute(&config.metrics.mapping_path),
            dashboards_dir: ctx.absolute(&config.metrics.dashboards_dir),
            network: config.docker.network.clone(),
            credentials: Some(BrokerCredentials {
                user: config.rabbitmq.user.clone(),
                password: config.rabbitmq.password.clone(),
            }),
            step_delay: Duration::from_millis(config.docker.step_delay_ms),
            on_progress,
        },
    )
}

fn scaffold_deps(ctx: &LocalContext) -> ScaffoldDeps {
    ScaffoldDeps {
        templates: build_project_templates(ctx.config(), ctx.working_dir()),
        writer: build_artifact_writer(),
    }
}
