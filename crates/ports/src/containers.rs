//! Container runtime boundary contract.

use svcplus_domain::{ComposeRequest, ContainerSpec};
use svcplus_shared::Result;
use std::fmt;

/// Identifier printed by the container tool for a started container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(Box<str>);

impl ContainerId {
    /// Wrap raw tool output (trimmed).
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().into())
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Boundary contract for the container tool.
///
/// Every call blocks until the tool exits. Failures map to `container:*`
/// error codes.
pub trait ContainerRuntimePort: Send + Sync {
    /// Verify the tool is installed, the daemon answers, and compose is present.
    fn check_available(&self) -> Result<()>;

    /// `compose up -d` for one compose file.
    fn compose_up(&self, request: &ComposeRequest) -> Result<()>;

    /// `compose down` for one compose file.
    fn compose_down(&self, request: &ComposeRequest) -> Result<()>;

    /// Run a detached container.
    fn run_container(&self, spec: &ContainerSpec) -> Result<ContainerId>;

    /// Force-remove a container by name.
    fn remove_container(&self, name: &str) -> Result<()>;

    /// Create a bridge network.
    fn create_network(&self, name: &str) -> Result<()>;

    /// Remove a network.
    fn remove_network(&self, name: &str) -> Result<()>;
}
