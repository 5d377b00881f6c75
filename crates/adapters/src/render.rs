//! Serde-backed renderers for the exporter mapping and Grafana dashboards.

use serde_json::{Value, json};
use svcplus_domain::{
    DashboardDocument, MappingDocument, MappingOptions, MetricBinding, ObserverType,
};
use svcplus_ports::DocumentRendererPort;
use svcplus_shared::{ErrorCode, ErrorEnvelope, Result};

/// Grafana dashboard schema version emitted by the renderer.
pub const DASHBOARD_SCHEMA_VERSION: u64 = 39;

const ROW_HEIGHT: u64 = 1;
const PANEL_HEIGHT: u64 = 8;
const PANEL_WIDTH: u64 = 12;
const QUANTILES: [&str; 3] = ["0.5", "0.9", "0.99"];

/// Renders mapping YAML with `serde_yaml_ng` and dashboards with `serde_json`.
#[derive(Debug, Clone)]
pub struct SerdeDocumentRenderer {
    metric: MappingOptions,
    datasource_uid: Box<str>,
}

impl SerdeDocumentRenderer {
    /// Panels query `metric` through the datasource `datasource_uid`.
    pub fn new(metric: MappingOptions, datasource_uid: impl Into<Box<str>>) -> Self {
        Self {
            metric,
            datasource_uid: datasource_uid.into(),
        }
    }

    fn datasource(&self) -> Value {
        json!({ "type": "prometheus", "uid": &*self.datasource_uid })
    }

    fn binding_panels(&self, binding: &MetricBinding, index: u64, next_id: &mut u64) -> Vec<Value> {
        let y = index * (ROW_HEIGHT + PANEL_HEIGHT);
        let selector = format!(
            "service=\"{}\",method=\"{}\"",
            binding.statsd_prefix, binding.stat_name
        );
        let metric = &self.metric.metric_name;

        let latency_targets: Vec<Value> = match self.metric.observer_type {
            ObserverType::Summary => vec![json!({
                "refId": "A",
                "datasource": self.datasource(),
                "expr": format!("{metric}{{{selector}}}"),
                "legendFormat": "p{{quantile}}",
            })],
            ObserverType::Histogram => QUANTILES
                .iter()
                .zip(["A", "B", "C"])
                .map(|(quantile, ref_id)| {
                    json!({
                        "refId": ref_id,
                        "datasource": self.datasource(),
                        "expr": format!(
                            "histogram_quantile({quantile}, sum(rate({metric}_bucket{{{selector}}}[1m])) by (le))"
                        ),
                        "legendFormat": format!("p{quantile}"),
                    })
                })
                .collect(),
        };

        let mut take_id = || {
            *next_id += 1;
            *next_id
        };
        vec![
            json!({
                "id": take_id(),
                "type": "row",
                "title": binding.statsd_metric(),
                "collapsed": false,
                "gridPos": { "h": ROW_HEIGHT, "w": PANEL_WIDTH * 2, "x": 0, "y": y },
                "panels": [],
            }),
            json!({
                "id": take_id(),
                "type": "timeseries",
                "title": format!("{} latency", binding.stat_name),
                "datasource": self.datasource(),
                "gridPos": { "h": PANEL_HEIGHT, "w": PANEL_WIDTH, "x": 0, "y": y + ROW_HEIGHT },
                "fieldConfig": { "defaults": { "unit": "s" }, "overrides": [] },
                "targets": latency_targets,
            }),
            json!({
                "id": take_id(),
                "type": "timeseries",
                "title": format!("{} calls", binding.stat_name),
                "datasource": self.datasource(),
                "gridPos": {
                    "h": PANEL_HEIGHT,
                    "w": PANEL_WIDTH,
                    "x": PANEL_WIDTH,
                    "y": y + ROW_HEIGHT,
                },
                "fieldConfig": { "defaults": { "unit": "reqps" }, "overrides": [] },
                "targets": [{
                    "refId": "A",
                    "datasource": self.datasource(),
                    "expr": format!("sum(rate({metric}_count{{{selector}}}[1m]))"),
                    "legendFormat": "calls/s",
                }],
            }),
        ]
    }

    /// Build the dashboard JSON value.
    #[must_use]
    pub fn dashboard_value(&self, document: &DashboardDocument) -> Value {
        let mut next_id = 0_u64;
        let panels: Vec<Value> = (0_u64..)
            .zip(&document.bindings)
            .flat_map(|(index, binding)| self.binding_panels(binding, index, &mut next_id))
            .collect();

        json!({
            "uid": document.uid.as_str(),
            "title": document.service_name.as_str(),
            "tags": ["svcplus", document.service_name.as_str()],
            "timezone": "browser",
            "editable": true,
            "schemaVersion": DASHBOARD_SCHEMA_VERSION,
            "version": 1,
            "refresh": "10s",
            "time": { "from": "now-1h", "to": "now" },
            "panels": panels,
        })
    }
}

impl DocumentRendererPort for SerdeDocumentRenderer {
    fn render_mapping(&self, document: &MappingDocument) -> Result<String> {
        serde_yaml_ng::to_string(document).map_err(|error| {
            render_failed("statsd_mapping", format!("failed to render mapping: {error}"))
        })
    }

    fn render_dashboard(&self, document: &DashboardDocument) -> Result<String> {
        let mut output =
            serde_json::to_string_pretty(&self.dashboard_value(document)).map_err(|error| {
                render_failed("grafana_dashboard", format!("failed to render dashboard: {error}"))
                    .with_metadata("class", document.service_name.as_str())
            })?;
        output.push('\n');
        Ok(output)
    }
}

fn render_failed(template: &str, message: String) -> ErrorEnvelope {
    ErrorEnvelope::expected(ErrorCode::render_failed(), message).with_metadata("template", template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use svcplus_domain::{BindingSet, ClassName, DashboardUid, StatName, StatsdPrefix};

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn binding(prefix: &str, stat: &str, class: &str) -> Result<MetricBinding> {
        Ok(MetricBinding {
            statsd_prefix: StatsdPrefix::parse(prefix)?,
            stat_name: StatName::parse(stat)?,
            class_name: ClassName::parse(class)?,
        })
    }

    fn renderer(observer_type: ObserverType) -> SerdeDocumentRenderer {
        SerdeDocumentRenderer::new(
            MappingOptions {
                observer_type,
                ..MappingOptions::default()
            },
            "prometheus",
        )
    }

    #[test]
    fn empty_mapping_matches_placeholder_file() -> TestResult {
        let document =
            MappingDocument::from_bindings(&BindingSet::default(), &MappingOptions::default());
        let yaml = renderer(ObserverType::Summary).render_mapping(&document)?;
        assert_eq!(yaml, svcplus_domain::EMPTY_MAPPING_YAML);
        Ok(())
    }

    #[test]
    fn mapping_yaml_uses_exporter_grammar() -> TestResult {
        let set = BindingSet::new(vec![binding("svcA", "hello", "A")?]);
        let document = MappingDocument::from_bindings(&set, &MappingOptions::default());
        let yaml = renderer(ObserverType::Summary).render_mapping(&document)?;
        assert_eq!(
            yaml,
            "mappings:\n\
             - match: svcA.hello\n  \
             observer_type: summary\n  \
             name: service_method_duration_seconds\n  \
             labels:\n    \
             service: svcA\n    \
             method: hello\n"
        );
        Ok(())
    }

    #[test]
    fn mapping_output_is_deterministic() -> TestResult {
        let set = BindingSet::new(vec![
            binding("svcA", "hello", "A")?,
            binding("svcB", "hello", "B")?,
        ]);
        let document = MappingDocument::from_bindings(&set, &MappingOptions::default());
        let renderer = renderer(ObserverType::Summary);
        assert_eq!(
            renderer.render_mapping(&document)?,
            renderer.render_mapping(&document)?
        );
        Ok(())
    }

    #[test]
    fn dashboard_has_a_row_and_two_panels_per_binding() -> TestResult {
        let document = DashboardDocument {
            uid: DashboardUid::random(),
            service_name: ClassName::parse("HttpDemoService")?,
            bindings: vec![
                binding("svcA", "demo_get", "HttpDemoService")?,
                binding("svcA", "demo_post", "HttpDemoService")?,
            ],
        };
        let text = renderer(ObserverType::Summary).render_dashboard(&document)?;
        assert!(text.ends_with('\n'));

        let value: Value = serde_json::from_str(&text)?;
        assert_eq!(value["title"], "HttpDemoService");
        assert_eq!(value["uid"], document.uid.as_str());
        let panels = &value["panels"];
        assert_eq!(panels.as_array().map(Vec::len), Some(6));
        assert_eq!(panels[3]["title"], "svcA.demo_post");
        assert_eq!(panels[3]["gridPos"]["y"], 9);
        assert_eq!(
            panels[2]["targets"][0]["expr"],
            "sum(rate(service_method_duration_seconds_count{service=\"svcA\",method=\"demo_get\"}[1m]))"
        );
        Ok(())
    }

    #[test]
    fn histogram_dashboards_query_buckets() -> TestResult {
        let document = DashboardDocument {
            uid: DashboardUid::random(),
            service_name: ClassName::parse("Timer")?,
            bindings: vec![binding("svcT", "ping", "Timer")?],
        };
        let value = renderer(ObserverType::Histogram).dashboard_value(&document);
        let targets = &value["panels"][1]["targets"];
        assert_eq!(targets.as_array().map(Vec::len), Some(3));
        let expr = targets[2]["expr"].as_str().ok_or("expr")?;
        assert!(expr.starts_with("histogram_quantile(0.99,"));
        assert!(expr.contains("service_method_duration_seconds_bucket"));
        Ok(())
    }
}
