//! Metric bindings discovered from instrumented methods.

use crate::{ClassName, StatName, StatsdPrefix};
use serde::{Deserialize, Serialize};

/// One instrumentation point: a timer on a method of a service class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricBinding {
    /// Metrics namespace configured on the owning class.
    pub statsd_prefix: StatsdPrefix,
    /// Metric leaf name declared by the timer.
    pub stat_name: StatName,
    /// Owning service class.
    pub class_name: ClassName,
}

impl MetricBinding {
    /// Raw statsd metric name (`{prefix}.{stat}`).
    #[must_use]
    pub fn statsd_metric(&self) -> String {
        format!("{}.{}", self.statsd_prefix, self.stat_name)
    }
}

/// Ordered bindings across all requested classes.
///
/// Order is discovery order; duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingSet(Vec<MetricBinding>);

impl BindingSet {
    /// Wrap bindings in discovery order.
    #[must_use]
    pub const fn new(bindings: Vec<MetricBinding>) -> Self {
        Self(bindings)
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no binding was discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, MetricBinding> {
        self.0.iter()
    }

    /// Bindings owned by `class`, by exact name match.
    #[must_use]
    pub fn for_class(&self, class: &ClassName) -> Vec<MetricBinding> {
        self.0
            .iter()
            .filter(|binding| &binding.class_name == class)
            .cloned()
            .collect()
    }
}

impl<'a> IntoIterator for &'a BindingSet {
    type Item = &'a MetricBinding;
    type IntoIter = std::slice::Iter<'a, MetricBinding>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
