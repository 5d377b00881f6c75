//! Generate the exporter mapping file and per-class Grafana dashboards.
//!
//! Resolution is fail-fast: the module and every requested class must resolve
//! before anything is written. Once writing starts, a failed artifact is
//! recorded and the remaining artifacts are still attempted.

use crate::progress::{Progress, ProgressSink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use svcplus_domain::{
    BindingSet, ClassName, DashboardPlan, DashboardUid, MappingDocument, MappingOptions, ModuleId,
    TextEncoding,
};
use svcplus_ports::{ArtifactWriterPort, DirState, DocumentRendererPort, ModuleResolverPort};
use svcplus_shared::{ErrorCode, ErrorEnvelope, Result};

/// Source of dashboard identifiers.
pub type UidSource = Arc<dyn Fn() -> DashboardUid + Send + Sync>;

/// Input payload for metric-config generation.
#[derive(Clone)]
pub struct MetricConfigInput {
    /// Module declaring the service classes.
    pub module: ModuleId,
    /// Requested classes, in order, without duplicates.
    pub classes: Vec<ClassName>,
    /// Mapping file destination (absolute).
    pub mapping_path: PathBuf,
    /// Dashboards directory (absolute).
    pub dashboards_dir: PathBuf,
    /// Exporter metric name and observer type.
    pub mapping_options: MappingOptions,
    /// Encoding of written files.
    pub encoding: TextEncoding,
    /// Optional progress callback.
    pub on_progress: Option<ProgressSink>,
}

/// Dependencies required by metric-config generation.
#[derive(Clone)]
pub struct MetricConfigDeps {
    /// Module resolver.
    pub resolver: Arc<dyn ModuleResolverPort>,
    /// Document renderer.
    pub renderer: Arc<dyn DocumentRendererPort>,
    /// Artifact writer.
    pub writer: Arc<dyn ArtifactWriterPort>,
    /// Dashboard uid source; random v4 identifiers when unset.
    pub uid_source: Option<UidSource>,
}

/// Artifact produced by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Exporter mapping file.
    Mapping,
    /// Dashboard for one class.
    Dashboard {
        /// Class the dashboard covers.
        class: ClassName,
    },
}

/// Outcome of one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReport {
    /// What was generated.
    pub kind: ArtifactKind,
    /// Destination path.
    pub path: PathBuf,
    /// Failure, if rendering or writing failed.
    pub error: Option<ErrorEnvelope>,
}

impl ArtifactReport {
    /// True when the artifact was written.
    #[must_use]
    pub const fn is_written(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricConfigOutput {
    /// Discovered bindings, in discovery order.
    pub bindings: BindingSet,
    /// Mapping report first, then one report per dashboard.
    pub artifacts: Vec<ArtifactReport>,
    /// Requested classes without instrumented methods.
    pub skipped: Vec<ClassName>,
}

impl MetricConfigOutput {
    /// First artifact failure, if any.
    #[must_use]
    pub fn first_failure(&self) -> Option<&ErrorEnvelope> {
        self.artifacts
            .iter()
            .find_map(|artifact| artifact.error.as_ref())
    }

    /// Number of artifacts that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.artifacts
            .iter()
            .filter(|artifact| !artifact.is_written())
            .count()
    }
}

/// Parse a comma-separated class list.
///
/// Entries are trimmed; empty entries are rejected; repeated classes keep
/// their first position.
pub fn parse_class_list(raw: &str) -> Result<Vec<ClassName>> {
    let mut classes: Vec<ClassName> = Vec::new();
    for entry in raw.split(',') {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "class list must not contain empty entries",
            )
            .with_metadata("classes", raw.to_owned()));
        }
        let class = ClassName::parse(trimmed)?;
        if classes.contains(&class) {
            tracing::debug!(class = class.as_str(), "ignoring repeated class");
            continue;
        }
        classes.push(class);
    }
    Ok(classes)
}

/// Resolve `module` and collect the bindings of `classes`.
pub fn discover_bindings(
    resolver: &dyn ModuleResolverPort,
    module: &ModuleId,
    classes: &[ClassName],
) -> Result<BindingSet> {
    if classes.is_empty() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "at least one class is required",
        ));
    }

    let resolved = resolver.resolve(module)?;
    let bindings = resolved.collect_bindings(classes).map_err(|missing| {
        ErrorEnvelope::expected(
            ErrorCode::class_not_found(),
            format!("module {module} has no class {missing}"),
        )
        .with_metadata("module", module.as_str())
        .with_metadata("class", missing.as_str())
    })?;

    tracing::debug!(
        module = module.as_str(),
        classes = classes.len(),
        bindings = bindings.len(),
        "discovered metric bindings"
    );
    Ok(bindings)
}

/// Generate the mapping file and dashboards for `input.classes`.
pub fn generate_metric_config(
    deps: &MetricConfigDeps,
    input: MetricConfigInput,
) -> Result<MetricConfigOutput> {
    let bindings = discover_bindings(deps.resolver.as_ref(), &input.module, &input.classes)?;
    let progress = Progress::new(input.on_progress.clone());

    let mapping = MappingDocument::from_bindings(&bindings, &input.mapping_options);
    let mapping_label = format!("Creating {}", file_label(&input.mapping_path));
    let mapping_result = progress.step(&mapping_label, || {
        let text = deps.renderer.render_mapping(&mapping)?;
        deps.writer
            .write_text(&input.mapping_path, &text, input.encoding)
    });
    let mut artifacts = vec![report(ArtifactKind::Mapping, &input.mapping_path, mapping_result)];

    let plan = match deps.uid_source.as_ref() {
        Some(source) => DashboardPlan::build(&bindings, &input.classes, || source()),
        None => DashboardPlan::build(&bindings, &input.classes, DashboardUid::random),
    };
    for class in &plan.skipped {
        tracing::debug!(
            class = class.as_str(),
            "class has no instrumented methods; no dashboard written"
        );
    }

    let dir_result = prepare_dashboards_dir(deps.writer.as_ref(), &progress, &input.dashboards_dir);
    for dashboard in &plan.dashboards {
        let path = input.dashboards_dir.join(dashboard.file_name());
        let kind = ArtifactKind::Dashboard {
            class: dashboard.service_name.clone(),
        };
        let result = match dir_result.as_ref() {
            Err(error) => Err(error.clone()),
            Ok(()) => progress.step(&format!("Creating {}", path.display()), || {
                let text = deps.renderer.render_dashboard(dashboard)?;
                deps.writer.write_text(&path, &text, input.encoding)
            }),
        };
        artifacts.push(report(kind, &path, result));
    }

    let output = MetricConfigOutput {
        bindings,
        artifacts,
        skipped: plan.skipped,
    };
    tracing::info!(
        module = input.module.as_str(),
        bindings = output.bindings.len(),
        artifacts = output.artifacts.len(),
        failed = output.failed_count(),
        "metric config generated"
    );
    Ok(output)
}

fn prepare_dashboards_dir(
    writer: &dyn ArtifactWriterPort,
    progress: &Progress,
    dir: &Path,
) -> Result<()> {
    match writer.dir_state(dir)? {
        DirState::Empty | DirState::NonEmpty => Ok(()),
        DirState::Missing => progress.step(
            &format!("Creating directory '{}'", dir.display()),
            || writer.create_dir_all(dir),
        ),
        DirState::NotADirectory => Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "dashboards path exists and is not a directory",
        )
        .with_metadata("path", dir.to_string_lossy().to_string())),
    }
}

fn report(kind: ArtifactKind, path: &Path, result: Result<()>) -> ArtifactReport {
    match result {
        Ok(()) => {
            tracing::info!(path = %path.display(), "artifact written");
            ArtifactReport {
                kind,
                path: path.to_path_buf(),
                error: None,
            }
        },
        Err(error) => {
            tracing::warn!(path = %path.display(), code = %error.code, "artifact failed");
            ArtifactReport {
                kind,
                path: path.to_path_buf(),
                error: Some(error.with_metadata("path", path.to_string_lossy().to_string())),
            }
        },
    }
}

fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_list_is_trimmed_and_deduplicated() -> Result<()> {
        let classes = parse_class_list(" A, B ,A")?;
        let names: Vec<&str> = classes.iter().map(ClassName::as_str).collect();
        assert_eq!(names, vec!["A", "B"]);
        Ok(())
    }

    #[test]
    fn class_list_rejects_empty_entries() {
        for raw in ["", "A,,B", "A, "] {
            let result = parse_class_list(raw);
            assert_eq!(
                result.err().map(|error| error.code),
                Some(ErrorCode::invalid_input()),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn class_list_rejects_non_identifiers() {
        assert!(parse_class_list("A,not-a-class").is_err());
    }

    #[test]
    fn file_label_uses_the_file_name() {
        assert_eq!(
            file_label(Path::new("/work/statsd_mapping.yml")),
            "statsd_mapping.yml"
        );
    }
}
