//! Template kinds for project and test scaffolding.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Directory names never copied from a template directory.
pub const BUILD_CACHE_DIRS: &[&str] = &[
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    "target",
    ".git",
];

/// Returns true when a directory entry named `name` is a build cache.
#[must_use]
pub fn is_build_cache_dir(name: &str) -> bool {
    BUILD_CACHE_DIRS.contains(&name)
}

/// Kind of project skeleton generated by `init`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    /// Every demo service in one module.
    #[default]
    All,
    /// RPC responder and caller.
    Rpc,
    /// Event publisher and listeners.
    Event,
    /// HTTP entrypoints.
    Http,
    /// Periodic timer entrypoint.
    Timer,
    /// Minimal RPC pair without instrumentation.
    Demo,
}

impl ProjectKind {
    /// Every kind, in help order.
    pub const ALL: [Self; 6] = [
        Self::All,
        Self::Rpc,
        Self::Event,
        Self::Http,
        Self::Timer,
        Self::Demo,
    ];

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Rpc => "rpc",
            Self::Event => "event",
            Self::Http => "http",
            Self::Timer => "timer",
            Self::Demo => "demo",
        }
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ProjectKind {
    type Err = UnknownKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value.trim())
            .ok_or_else(|| UnknownKind::new(value, &Self::ALL.map(Self::as_str)))
    }
}

/// Kind of test skeleton generated by `test-gen`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    /// Unit tests for a demo service.
    #[default]
    Unit,
}

impl TestKind {
    /// Every kind.
    pub const ALL: [Self; 1] = [Self::Unit];

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unit => "unit",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for TestKind {
    type Err = UnknownKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value.trim())
            .ok_or_else(|| UnknownKind::new(value, &Self::ALL.map(Self::as_str)))
    }
}

/// A kind name that is not in the allowed list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown kind `{input}` (expected one of: {expected})")]
pub struct UnknownKind {
    /// Rejected input.
    pub input: String,
    /// Comma-separated allowed names.
    pub expected: String,
}

impl UnknownKind {
    fn new(input: &str, expected: &[&str]) -> Self {
        Self {
            input: input.to_owned(),
            expected: expected.join(", "),
        }
    }
}

/// Group of template files served by a template store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateSet {
    /// Project skeleton for `init`.
    Project(ProjectKind),
    /// Test skeleton for `test-gen`.
    Tests(TestKind),
    /// Middleware agent configuration (compose files, exporter configs).
    Agent,
}

impl TemplateSet {
    /// Relative directory of the set inside a template root.
    #[must_use]
    pub fn relative_dir(self) -> String {
        match self {
            Self::Project(kind) => kind.as_str().to_owned(),
            Self::Tests(kind) => format!("tests/{kind}"),
            Self::Agent => "agent".to_owned(),
        }
    }
}

impl fmt::Display for TemplateSet {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.relative_dir())
    }
}

/// One file of a template set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Path relative to the destination root, `/`-separated.
    pub relative_path: Box<str>,
    /// File contents.
    pub contents: Vec<u8>,
}

impl TemplateFile {
    /// Build a text template file.
    pub fn text(relative_path: impl Into<Box<str>>, contents: &str) -> Self {
        Self {
            relative_path: relative_path.into(),
            contents: contents.as_bytes().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_kind_parses_known_names() -> Result<(), UnknownKind> {
        for kind in ProjectKind::ALL {
            assert_eq!(kind.as_str().parse::<ProjectKind>()?, kind);
        }
        Ok(())
    }

    #[test]
    fn unknown_kind_lists_expected_names() {
        let Err(error) = "grpc".parse::<ProjectKind>() else {
            return;
        };
        assert_eq!(error.input, "grpc");
        assert!(error.to_string().contains("all, rpc, event, http, timer, demo"));
    }

    #[test]
    fn test_kind_defaults_to_unit() -> Result<(), UnknownKind> {
        assert_eq!(TestKind::default(), "unit".parse::<TestKind>()?);
        Ok(())
    }

    #[test]
    fn template_set_dirs_are_stable() {
        assert_eq!(TemplateSet::Project(ProjectKind::Http).relative_dir(), "http");
        assert_eq!(TemplateSet::Tests(TestKind::Unit).relative_dir(), "tests/unit");
        assert_eq!(TemplateSet::Agent.relative_dir(), "agent");
    }

    #[test]
    fn build_cache_dirs_are_recognized() {
        assert!(is_build_cache_dir("__pycache__"));
        assert!(is_build_cache_dir(".git"));
        assert!(!is_build_cache_dir("src"));
    }
}
