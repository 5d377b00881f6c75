//! # svcplus-infra
//!
//! Infrastructure wiring and runtime composition.
//! This crate depends on `app`, `adapters`, `config`, and `shared`.

/// Adapter selection from the validated config.
pub mod adapter_factory;
/// Local CLI orchestration helpers.
pub mod cli_local;
/// Config loading helpers used by CLI surfaces.
pub mod config_check;
/// Environment validation helpers used by CLI surfaces.
pub mod env_check;

pub use adapter_factory::{
    build_agent_templates, build_artifact_writer, build_container_runtime,
    build_document_renderer, build_module_resolver, build_project_templates, resolve_path,
};
pub use cli_local::{
    InfoSummary, LocalContext, read_info_local, run_init_local, run_metric_config_local,
    run_middleware_local, run_test_gen_local,
};
pub use config_check::{
    ConfigCheckReport, ConfigShowFormat, EffectiveConfig, check_config, load_effective_config,
};
pub use env_check::{InfraError, InfraResult, validate_env_parsing};

// Re-export redaction utilities for CLI boundary sanitization
pub use svcplus_shared::{is_secret_key, redact_if_secret};

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
