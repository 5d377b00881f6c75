//! Document renderer boundary contract.

use svcplus_domain::{DashboardDocument, MappingDocument};
use svcplus_shared::Result;

/// Serializes generated monitoring documents to text.
///
/// Failures map to `render:serialize_failed` with a `template` metadata entry
/// naming the artifact kind.
pub trait DocumentRendererPort: Send + Sync {
    /// Render the exporter mapping file.
    fn render_mapping(&self, document: &MappingDocument) -> Result<String>;

    /// Render one dashboard file.
    fn render_dashboard(&self, document: &DashboardDocument) -> Result<String>;
}
