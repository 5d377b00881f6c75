//! # svcplus-ports
//!
//! Port traits for the svcplus hexagonal architecture.
//!
//! This crate defines the interfaces between the use cases and the outside
//! world: module resolution, template storage, document rendering, artifact
//! writing, and the container tool. It depends only on `domain` and `shared`.
//!
//! All ports are synchronous; svcplus runs one step at a time.

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod artifacts;
pub mod containers;
pub mod modules;
pub mod render;
pub mod templates;

pub use artifacts::*;
pub use containers::*;
pub use modules::*;
pub use render::*;
pub use templates::*;

// Re-export selected domain types used in port signatures, so adapter crates
// can implement ports without naming `svcplus-domain` for them.
pub use svcplus_domain::{
    ComposeRequest, ContainerSpec, DashboardDocument, MappingDocument, ModuleId, ServiceModule,
    TemplateFile, TemplateSet, TextEncoding,
};

#[cfg(test)]
mod tests {
    use super::*;
    use svcplus_domain::domain_crate_version;
    use svcplus_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]" || line == "[dev-dependencies]";
                continue;
            }
            if in_deps && line.starts_with("svcplus-") {
                let key = line.split('=').next().unwrap_or("").trim();
                let name = key.split('.').next().unwrap_or("").trim();
                deps.push(name.to_string());
            }
        }

        deps
    }

    #[test]
    fn ports_depends_only_on_domain_and_shared() {
        let deps = workspace_deps();
        let allowed = ["svcplus-domain", "svcplus-shared"];

        for dep in &deps {
            assert!(
                allowed.contains(&dep.as_str()),
                "unexpected dependency found: {dep}"
            );
        }
        for expected in allowed {
            assert!(
                deps.iter().any(|dep| dep == expected),
                "missing dependency: {expected}"
            );
        }
    }

    #[test]
    fn ports_can_use_domain_and_shared() {
        assert!(!ports_crate_version().is_empty());
        assert!(!domain_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
