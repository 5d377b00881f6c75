//! Module resolution boundary contract.

use svcplus_domain::{ModuleId, ServiceModule};
use svcplus_shared::Result;

/// Resolves a module identifier to its declared service classes.
///
/// Unknown modules fail with `module:not_found`; a module that exists but
/// cannot be read fails with `module:invalid_manifest`.
pub trait ModuleResolverPort: Send + Sync {
    /// Resolve `module`.
    fn resolve(&self, module: &ModuleId) -> Result<ServiceModule>;
}
