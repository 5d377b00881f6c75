//! Template store boundary contract.

use svcplus_domain::{TemplateFile, TemplateSet};
use svcplus_shared::Result;

/// Serves the files of a template set.
pub trait TemplateStorePort: Send + Sync {
    /// Every file of `set`, in a stable order.
    ///
    /// A set the store does not carry fails with `scaffold:unknown_template`.
    fn template_files(&self, set: TemplateSet) -> Result<Vec<TemplateFile>>;

    /// Human-readable origin of the templates (for logs and `info`).
    fn describe(&self) -> String;
}
