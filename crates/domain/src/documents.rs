//! Monitoring documents derived from a [`BindingSet`].

use crate::{BindingSet, ClassName, MetricBinding};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default exporter metric name for method timings.
pub const DEFAULT_METRIC_NAME: &str = "service_method_duration_seconds";

/// Mapping file content with no rules, as the YAML renderer emits it.
pub const EMPTY_MAPPING_YAML: &str = "mappings: []\n";

/// Exporter observer used for timer samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObserverType {
    /// Quantile summary.
    #[default]
    Summary,
    /// Bucketed histogram.
    Histogram,
}

impl ObserverType {
    /// Wire name used in the mapping grammar.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Histogram => "histogram",
        }
    }
}

impl fmt::Display for ObserverType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Labels attached to a mapped metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingLabels {
    /// Metrics namespace of the owning class.
    pub service: String,
    /// Timer stat name.
    pub method: String,
}

/// One exporter rule translating a raw statsd name into a labeled metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    /// Raw statsd metric name (`{prefix}.{stat}`).
    #[serde(rename = "match")]
    pub pattern: String,
    /// Observer type for timer samples.
    pub observer_type: ObserverType,
    /// Exporter metric name.
    pub name: String,
    /// Labels attached to the metric.
    pub labels: MappingLabels,
}

impl MappingRule {
    /// Build the rule for a binding.
    #[must_use]
    pub fn for_binding(binding: &MetricBinding, options: &MappingOptions) -> Self {
        Self {
            pattern: binding.statsd_metric(),
            observer_type: options.observer_type,
            name: options.metric_name.clone(),
            labels: MappingLabels {
                service: binding.statsd_prefix.to_string(),
                method: binding.stat_name.to_string(),
            },
        }
    }
}

/// Rendering knobs for the mapping document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingOptions {
    /// Exporter metric name shared by every rule.
    pub metric_name: String,
    /// Observer type shared by every rule.
    pub observer_type: ObserverType,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            metric_name: DEFAULT_METRIC_NAME.to_owned(),
            observer_type: ObserverType::Summary,
        }
    }
}

/// Exporter mapping document: one rule per binding, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDocument {
    /// Rules in discovery order.
    pub mappings: Vec<MappingRule>,
}

impl MappingDocument {
    /// Build the document from the whole binding set.
    #[must_use]
    pub fn from_bindings(bindings: &BindingSet, options: &MappingOptions) -> Self {
        Self {
            mappings: bindings
                .iter()
                .map(|binding| MappingRule::for_binding(binding, options))
                .collect(),
        }
    }
}

/// Text encoding used when writing rendered artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    /// UTF-8 (any text is encodable).
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    /// 7-bit ASCII.
    #[serde(rename = "ascii")]
    Ascii,
}

impl TextEncoding {
    /// Stable name used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Ascii => "ascii",
        }
    }

    /// Parse a configured name (case-insensitive, `utf8` accepted).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "ascii" | "us-ascii" => Some(Self::Ascii),
            _ => None,
        }
    }

    /// Encode `text`, reporting the first character that does not fit.
    pub fn encode(self, text: &str) -> Result<Vec<u8>, UnencodableChar> {
        if self == Self::Ascii {
            if let Some((offset, ch)) = text.char_indices().find(|(_, ch)| !ch.is_ascii()) {
                return Err(UnencodableChar {
                    offset,
                    ch,
                    encoding: self,
                });
            }
        }
        Ok(text.as_bytes().to_vec())
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A character that the target encoding cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("character {ch:?} at byte {offset} cannot be encoded as {encoding}")]
pub struct UnencodableChar {
    /// Byte offset in the source text.
    pub offset: usize,
    /// Offending character.
    pub ch: char,
    /// Target encoding.
    pub encoding: TextEncoding,
}

/// Dashboard identifier: 32 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DashboardUid(Box<str>);

impl DashboardUid {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string().into_boxed_str())
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DashboardUid {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Dashboard for one service class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardDocument {
    /// Fresh identifier for this run.
    pub uid: DashboardUid,
    /// Class name, also the dashboard title.
    pub service_name: ClassName,
    /// Non-empty bindings of the class.
    pub bindings: Vec<MetricBinding>,
}

impl DashboardDocument {
    /// Deterministic file name for the class dashboard.
    #[must_use]
    pub fn file_name(&self) -> String {
        dashboard_file_name(&self.service_name)
    }
}

/// File name of the dashboard for `class`.
#[must_use]
pub fn dashboard_file_name(class: &ClassName) -> String {
    format!("{class}_Grafana.json")
}

/// Dashboards to write plus classes that contributed no binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardPlan {
    /// One dashboard per requested class with bindings, in request order.
    pub dashboards: Vec<DashboardDocument>,
    /// Requested classes without instrumented methods.
    pub skipped: Vec<ClassName>,
}

impl DashboardPlan {
    /// Partition `bindings` by requested class.
    ///
    /// `next_uid` is called once per produced dashboard.
    pub fn build(
        bindings: &BindingSet,
        requested: &[ClassName],
        mut next_uid: impl FnMut() -> DashboardUid,
    ) -> Self {
        let mut plan = Self::default();
        for class in requested {
            let subset = bindings.for_class(class);
            if subset.is_empty() {
                plan.skipped.push(class.clone());
                continue;
            }
            plan.dashboards.push(DashboardDocument {
                uid: next_uid(),
                service_name: class.clone(),
                bindings: subset,
            });
        }
        plan
    }
}
