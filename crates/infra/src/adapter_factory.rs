//! Adapter selection from the validated config.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use svcplus_adapters::{
    DirectoryTemplateStore, DockerCli, EmbeddedTemplateStore, LocalArtifactWriter,
    ManifestModuleResolver, SerdeDocumentRenderer, manifest_root_or,
};
use svcplus_config::ValidatedSvcplusConfig;
use svcplus_ports::{
    ArtifactWriterPort, ContainerRuntimePort, DocumentRendererPort, ModuleResolverPort,
    TemplateStorePort,
};

/// Resolve `path` against `working_dir` when relative.
#[must_use]
pub fn resolve_path(working_dir: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    };
    std::path::absolute(&joined).unwrap_or(joined)
}

/// Manifest resolver rooted at `modules.root` (or the working directory).
pub fn build_module_resolver(
    config: &ValidatedSvcplusConfig,
    working_dir: &Path,
) -> Arc<dyn ModuleResolverPort> {
    let root = manifest_root_or(config.modules.root.as_deref(), working_dir);
    tracing::debug!(root = %root.display(), "module manifests root");
    Arc::new(ManifestModuleResolver::new(root))
}

/// Project and test templates: `templates.root` when set, embedded otherwise.
pub fn build_project_templates(
    config: &ValidatedSvcplusConfig,
    working_dir: &Path,
) -> Arc<dyn TemplateStorePort> {
    match config.templates.root.as_deref() {
        Some(root) => Arc::new(DirectoryTemplateStore::new(resolve_path(working_dir, root))),
        None => Arc::new(EmbeddedTemplateStore::new()),
    }
}

/// Middleware agent assets always ship with the binary.
pub fn build_agent_templates() -> Arc<dyn TemplateStorePort> {
    Arc::new(EmbeddedTemplateStore::new())
}

/// Mapping and dashboard renderer configured from `metrics`.
pub fn build_document_renderer(config: &ValidatedSvcplusConfig) -> Arc<dyn DocumentRendererPort> {
    Arc::new(SerdeDocumentRenderer::new(
        config.metrics.mapping_options(),
        config.metrics.datasource_uid.clone(),
    ))
}

/// Container runtime driving `docker.binary`.
pub fn build_container_runtime(config: &ValidatedSvcplusConfig) -> Arc<dyn ContainerRuntimePort> {
    Arc::new(DockerCli::new(config.docker.binary.clone()))
}

/// Local filesystem writer.
pub fn build_artifact_writer() -> Arc<dyn ArtifactWriterPort> {
    Arc::new(LocalArtifactWriter::new())
}
