//! # svcplus-app
//!
//! Application use cases: metric config generation, project and test
//! scaffolding, and the middleware lifecycle.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod metric_config;
pub mod middleware;
pub mod progress;
pub mod scaffold;

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use metric_config::{
    ArtifactKind, ArtifactReport, MetricConfigDeps, MetricConfigInput, MetricConfigOutput,
    UidSource, discover_bindings, generate_metric_config, parse_class_list,
};
pub use middleware::{
    MiddlewareAction, MiddlewareDeps, MiddlewareInput, MiddlewareOutput, StepReport,
    run_middleware, start_middleware, stop_middleware,
};
pub use progress::{ProgressEvent, ProgressSink};
pub use scaffold::{
    GenerateTestsInput, InitProjectInput, ScaffoldDeps, ScaffoldOutput, generate_tests,
    init_project,
};
