//! # svcplus-domain
//!
//! Domain entities and value objects for svcplus.
//!
//! - **Primitives** - `ModuleId`, `ClassName`, `MethodName`, `StatsdPrefix`, `StatName`
//! - **Registry** - `StatsClient`, `Timer`, `ServiceClass`, `ServiceModule`, `MetricRegistry`
//! - **Metrics** - `MetricBinding`, `BindingSet`
//! - **Documents** - `MappingDocument`, `DashboardDocument`, `DashboardPlan`
//! - **Scaffold** - `ProjectKind`, `TestKind`, `TemplateSet`, `TemplateFile`
//! - **Middleware** - `Middleware`, `ContainerSpec`, `MiddlewareStep` plans
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No infrastructure or adapter dependencies
//! - Pure domain logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use svcplus_shared::shared_crate_version;

// =============================================================================
// DOMAIN MODULES
// =============================================================================

pub mod documents;
pub mod metric;
pub mod middleware;
pub mod primitives;
pub mod registry;
pub mod scaffold;

pub use documents::{
    DEFAULT_METRIC_NAME, DashboardDocument, DashboardPlan, DashboardUid, EMPTY_MAPPING_YAML,
    MappingDocument, MappingLabels, MappingOptions, MappingRule, ObserverType, TextEncoding,
    UnencodableChar, dashboard_file_name,
};
pub use metric::{BindingSet, MetricBinding};
pub use middleware::{
    BrokerCredentials, ComposeRequest, ContainerSpec, DEFAULT_METRICS_NETWORK, MetricsLayout,
    Middleware, MiddlewareStep, PortMapping, VolumeMount, metrics_start_plan, metrics_stop_plan,
    rabbitmq_compose_dir,
};
pub use primitives::{ClassName, MethodName, ModuleId, PrimitiveError, StatName, StatsdPrefix};
pub use registry::{
    DEFAULT_STATSD_PORT, MetricRegistry, ServiceClass, ServiceClassBuilder, ServiceMethod,
    ServiceModule, StatsClient, Timer,
};
pub use scaffold::{
    BUILD_CACHE_DIRS, ProjectKind, TemplateFile, TemplateSet, TestKind, UnknownKind,
    is_build_cache_dir,
};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
