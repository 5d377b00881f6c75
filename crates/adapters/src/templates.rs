//! Template stores: assets compiled into the binary, or a directory on disk.

use std::path::{Path, PathBuf};
use svcplus_domain::{TemplateFile, TemplateSet, is_build_cache_dir};
use svcplus_ports::TemplateStorePort;
use svcplus_shared::{ErrorCode, ErrorEnvelope, Result, io_error_at};

macro_rules! embedded {
    ($set:literal, $path:literal) => {
        EmbeddedAsset {
            set_dir: $set,
            relative_path: $path,
            contents: include_str!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/templates/",
                $set,
                "/",
                $path
            )),
        }
    };
}

struct EmbeddedAsset {
    set_dir: &'static str,
    relative_path: &'static str,
    contents: &'static str,
}

const EMBEDDED_ASSETS: &[EmbeddedAsset] = &[
    embedded!("all", "README.md"),
    embedded!("all", "all_demo.py"),
    embedded!("all", "all_demo.toml"),
    embedded!("all", "config.yml"),
    embedded!("rpc", "README.md"),
    embedded!("rpc", "config.yml"),
    embedded!("rpc", "rpc_demo.py"),
    embedded!("rpc", "rpc_demo.toml"),
    embedded!("event", "README.md"),
    embedded!("event", "config.yml"),
    embedded!("event", "event_demo.py"),
    embedded!("event", "event_demo.toml"),
    embedded!("http", "README.md"),
    embedded!("http", "config.yml"),
    embedded!("http", "http_demo.py"),
    embedded!("http", "http_demo.toml"),
    embedded!("timer", "README.md"),
    embedded!("timer", "config.yml"),
    embedded!("timer", "timer_demo.py"),
    embedded!("timer", "timer_demo.toml"),
    embedded!("demo", "README.md"),
    embedded!("demo", "config.yml"),
    embedded!("demo", "demo_demo.py"),
    embedded!("demo", "demo_demo.toml"),
    embedded!("tests/unit", "conftest.py"),
    embedded!("tests/unit", "test_service.py"),
    embedded!("agent", "grafana/grafana.ini"),
    embedded!("agent", "grafana/provisioning/dashboards/dashboards.yml"),
    embedded!("agent", "grafana/provisioning/datasources/datasource.yml"),
    embedded!("agent", "prometheus/prometheus.yml"),
    embedded!("agent", "rabbitmq/docker-compose.yml"),
    embedded!("agent", "statsd/config.js"),
];

/// Templates compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTemplateStore;

impl EmbeddedTemplateStore {
    /// Build the embedded store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TemplateStorePort for EmbeddedTemplateStore {
    fn template_files(&self, set: TemplateSet) -> Result<Vec<TemplateFile>> {
        let set_dir = set.relative_dir();
        let files: Vec<TemplateFile> = EMBEDDED_ASSETS
            .iter()
            .filter(|asset| asset.set_dir == set_dir)
            .map(|asset| TemplateFile::text(asset.relative_path, asset.contents))
            .collect();
        if files.is_empty() {
            return Err(unknown_template(set));
        }
        Ok(files)
    }

    fn describe(&self) -> String {
        "embedded".to_owned()
    }
}

/// Templates read from `<root>/<set dir>/`.
///
/// Build-cache directories are skipped; files are returned sorted by path.
#[derive(Debug, Clone)]
pub struct DirectoryTemplateStore {
    root: PathBuf,
}

impl DirectoryTemplateStore {
    /// Serve templates under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TemplateStorePort for DirectoryTemplateStore {
    fn template_files(&self, set: TemplateSet) -> Result<Vec<TemplateFile>> {
        let set_root = self.root.join(set.relative_dir());
        if !set_root.is_dir() {
            return Err(unknown_template(set)
                .with_metadata("path", set_root.to_string_lossy().to_string()));
        }

        let mut files = Vec::new();
        collect_files(&set_root, &set_root, &mut files)?;
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        tracing::debug!(
            root = %set_root.display(),
            files = files.len(),
            "loaded directory templates"
        );
        Ok(files)
    }

    fn describe(&self) -> String {
        self.root.to_string_lossy().to_string()
    }
}

fn collect_files(base: &Path, dir: &Path, output: &mut Vec<TemplateFile>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|error| io_error_at(dir, error))?;
    for entry in entries {
        let entry = entry.map_err(|error| io_error_at(dir, error))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|error| io_error_at(&path, error))?;
        let name = entry.file_name();
        if file_type.is_dir() {
            if is_build_cache_dir(&name.to_string_lossy()) {
                continue;
            }
            collect_files(base, &path, output)?;
        } else if file_type.is_file() {
            let contents = std::fs::read(&path).map_err(|error| io_error_at(&path, error))?;
            output.push(TemplateFile {
                relative_path: relative_slash_path(base, &path).into_boxed_str(),
                contents,
            });
        }
    }
    Ok(())
}

fn relative_slash_path(base: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn unknown_template(set: TemplateSet) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::new("scaffold", "unknown_template"),
        format!("no such template type {set}"),
    )
    .with_metadata("template", set.relative_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use svcplus_domain::{ProjectKind, TestKind};

    fn temp_root(label: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos());
        std::env::temp_dir().join(format!("svcplus-templates-{label}-{nanos}"))
    }

    #[test]
    fn every_project_kind_has_embedded_templates() -> Result<()> {
        let store = EmbeddedTemplateStore::new();
        for kind in ProjectKind::ALL {
            let files = store.template_files(TemplateSet::Project(kind))?;
            let manifest = format!("{}_demo.toml", kind.as_str());
            assert!(
                files.iter().any(|file| *file.relative_path == *manifest),
                "missing {manifest}"
            );
            assert!(files.iter().any(|file| &*file.relative_path == "config.yml"));
        }
        Ok(())
    }

    #[test]
    fn agent_assets_cover_the_metrics_stack() -> Result<()> {
        let files = EmbeddedTemplateStore::new().template_files(TemplateSet::Agent)?;
        for expected in [
            "rabbitmq/docker-compose.yml",
            "statsd/config.js",
            "prometheus/prometheus.yml",
            "grafana/grafana.ini",
        ] {
            assert!(
                files.iter().any(|file| &*file.relative_path == expected),
                "missing {expected}"
            );
        }
        Ok(())
    }

    #[test]
    fn unit_test_templates_are_embedded() -> Result<()> {
        let files =
            EmbeddedTemplateStore::new().template_files(TemplateSet::Tests(TestKind::Unit))?;
        assert!(files.iter().any(|file| &*file.relative_path == "test_service.py"));
        Ok(())
    }

    #[test]
    fn directory_store_skips_build_caches() -> Result<()> {
        let root = temp_root("dir");
        let set_root = root.join("rpc");
        std::fs::create_dir_all(set_root.join("__pycache__"))?;
        std::fs::create_dir_all(set_root.join("nested"))?;
        std::fs::write(set_root.join("service.py"), "print('hi')\n")?;
        std::fs::write(set_root.join("nested").join("extra.txt"), "x")?;
        std::fs::write(set_root.join("__pycache__").join("service.pyc"), "junk")?;

        let files = DirectoryTemplateStore::new(&root)
            .template_files(TemplateSet::Project(ProjectKind::Rpc))?;
        let paths: Vec<&str> = files.iter().map(|file| &*file.relative_path).collect();
        assert_eq!(paths, vec!["nested/extra.txt", "service.py"]);

        std::fs::remove_dir_all(&root)?;
        Ok(())
    }

    #[test]
    fn directory_store_reports_unknown_set() {
        let store = DirectoryTemplateStore::new(temp_root("missing"));
        let Err(error) = store.template_files(TemplateSet::Project(ProjectKind::Http)) else {
            return;
        };
        assert_eq!(error.code, ErrorCode::new("scaffold", "unknown_template"));
        assert_eq!(error.metadata.get("template").map(String::as_str), Some("http"));
    }
}
