//! Module resolvers: TOML service-module manifests and in-memory tables.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use svcplus_domain::{
    ClassName, MethodName, MetricRegistry, ModuleId, ServiceClass, ServiceMethod, ServiceModule,
    StatName, StatsClient, StatsdPrefix,
};
use svcplus_ports::ModuleResolverPort;
use svcplus_shared::{ErrorCode, ErrorEnvelope, Result, io_error_at};

/// File extension of service-module manifests.
pub const MANIFEST_EXTENSION: &str = "toml";

/// Resolves `a.b.c` to `<root>/a/b/c.toml`.
#[derive(Debug, Clone)]
pub struct ManifestModuleResolver {
    root: PathBuf,
}

impl ManifestModuleResolver {
    /// Resolve manifests under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Manifest path for `module`.
    #[must_use]
    pub fn manifest_path(&self, module: &ModuleId) -> PathBuf {
        let mut path = self.root.clone();
        for segment in module.segments() {
            path.push(segment);
        }
        path.set_extension(MANIFEST_EXTENSION);
        path
    }
}

impl ModuleResolverPort for ManifestModuleResolver {
    fn resolve(&self, module: &ModuleId) -> Result<ServiceModule> {
        let path = self.manifest_path(module);
        let text = std::fs::read_to_string(&path).map_err(|error| {
            if error.kind() == std::io::ErrorKind::NotFound {
                ErrorEnvelope::expected(
                    ErrorCode::module_not_found(),
                    format!("no module named {module}"),
                )
                .with_metadata("module", module.as_str())
                .with_metadata("path", path.to_string_lossy().to_string())
            } else {
                io_error_at(&path, error)
            }
        })?;

        let resolved = parse_manifest(module, &text)
            .map_err(|error| error.with_metadata("path", path.to_string_lossy().to_string()))?;
        tracing::debug!(
            module = module.as_str(),
            path = %path.display(),
            classes = resolved.classes.len(),
            "resolved service module"
        );
        Ok(resolved)
    }
}

/// Parse a service-module manifest.
///
/// Rejects unknown keys, duplicate classes, invalid identifiers, and timers
/// on classes without a `statsd` table.
pub fn parse_manifest(module: &ModuleId, text: &str) -> Result<ServiceModule> {
    let manifest: ManifestFile = toml::from_str(text).map_err(|error| {
        invalid_manifest(module, format!("invalid manifest TOML: {error}"))
    })?;

    let mut seen = BTreeSet::new();
    let mut classes = Vec::with_capacity(manifest.classes.len());
    for entry in manifest.classes {
        let class = build_class(module, entry)?;
        if !seen.insert(class.name.clone()) {
            return Err(invalid_manifest(module, "duplicate class in manifest")
                .with_metadata("class", class.name.as_str()));
        }
        classes.push(class);
    }
    Ok(ServiceModule::new(classes))
}

fn build_class(module: &ModuleId, entry: ClassEntry) -> Result<ServiceClass> {
    let name = ClassName::parse(&entry.name)
        .map_err(|error| invalid_manifest(module, error.to_string()))?;

    let statsd = entry
        .statsd
        .map(|statsd| build_stats_client(module, &name, statsd))
        .transpose()?;

    let mut builder = ServiceClass::builder(name.clone());
    if let Some(service) = entry.service {
        builder = builder.service(service);
    }
    if let Some(client) = statsd.clone() {
        builder = builder.statsd(client);
    }

    for method in entry.methods {
        let method_name = MethodName::parse(&method.name).map_err(|error| {
            invalid_manifest(module, error.to_string()).with_metadata("class", name.as_str())
        })?;
        let timer = match (method.timer, statsd.as_ref()) {
            (None, _) => None,
            (Some(stat), Some(client)) => {
                let stat = StatName::parse(&stat).map_err(|error| {
                    invalid_manifest(module, error.to_string())
                        .with_metadata("class", name.as_str())
                        .with_metadata("method", method_name.as_str())
                })?;
                Some(client.timer(stat))
            },
            (Some(_), None) => {
                return Err(invalid_manifest(
                    module,
                    "method declares a timer but its class has no statsd client",
                )
                .with_metadata("class", name.as_str())
                .with_metadata("method", method_name.as_str()));
            },
        };
        builder = builder.push(ServiceMethod {
            name: method_name,
            entrypoint: method.entrypoint.map(String::into_boxed_str),
            timer,
        });
    }

    Ok(builder.build())
}

fn build_stats_client(
    module: &ModuleId,
    class: &ClassName,
    entry: StatsdEntry,
) -> Result<StatsClient> {
    let prefix = StatsdPrefix::parse(&entry.prefix).map_err(|error| {
        invalid_manifest(module, error.to_string()).with_metadata("class", class.as_str())
    })?;
    let mut client = StatsClient::new(prefix);
    if let Some(host) = entry.host {
        client = client.with_host(host);
    }
    if let Some(port) = entry.port {
        client = client.with_port(port);
    }
    Ok(client)
}

fn invalid_manifest(module: &ModuleId, message: impl Into<String>) -> ErrorEnvelope {
    ErrorEnvelope::expected(ErrorCode::invalid_manifest(), message)
        .with_metadata("module", module.as_str())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default, rename = "class")]
    classes: Vec<ClassEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassEntry {
    name: String,
    #[serde(default)]
    service: Option<String>,
    #[serde(default)]
    statsd: Option<StatsdEntry>,
    #[serde(default, rename = "method")]
    methods: Vec<MethodEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StatsdEntry {
    prefix: String,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MethodEntry {
    name: String,
    #[serde(default)]
    entrypoint: Option<String>,
    #[serde(default)]
    timer: Option<String>,
}

/// Explicit in-memory module table supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct StaticModuleTable {
    registry: MetricRegistry,
}

impl StaticModuleTable {
    /// Wrap a filled registry.
    #[must_use]
    pub const fn new(registry: MetricRegistry) -> Self {
        Self { registry }
    }
}

impl ModuleResolverPort for StaticModuleTable {
    fn resolve(&self, module: &ModuleId) -> Result<ServiceModule> {
        self.registry.module(module).cloned().ok_or_else(|| {
            ErrorEnvelope::expected(
                ErrorCode::module_not_found(),
                format!("no module named {module}"),
            )
            .with_metadata("module", module.as_str())
        })
    }
}

/// Default manifest root when none is configured.
#[must_use]
pub fn manifest_root_or(configured: Option<&Path>, working_dir: &Path) -> PathBuf {
    match configured {
        Some(root) if root.is_absolute() => root.to_path_buf(),
        Some(root) => working_dir.join(root),
        None => working_dir.to_path_buf(),
    }
}
