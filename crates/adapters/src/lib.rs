//! # svcplus-adapters
//!
//! Adapter implementations for ports (manifests, templates, filesystem,
//! container tool, document rendering).
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod docker;
pub mod fs;
pub mod manifest;
pub mod render;
pub mod templates;

pub use docker::{DockerCli, RABBITMQ_PASSWORD_VAR, RABBITMQ_USER_VAR, compose_args, run_args};
pub use fs::LocalArtifactWriter;
pub use manifest::{
    MANIFEST_EXTENSION, ManifestModuleResolver, StaticModuleTable, manifest_root_or,
    parse_manifest,
};
pub use render::{DASHBOARD_SCHEMA_VERSION, SerdeDocumentRenderer};
pub use templates::{DirectoryTemplateStore, EmbeddedTemplateStore};

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
