//! Scaffolding against the embedded templates and the local filesystem.

use std::path::PathBuf;
use std::sync::Arc;
use svcplus_adapters::{
    DirectoryTemplateStore, EmbeddedTemplateStore, LocalArtifactWriter, ManifestModuleResolver,
};
use svcplus_app::{
    GenerateTestsInput, InitProjectInput, ScaffoldDeps, discover_bindings, generate_tests,
    init_project, parse_class_list,
};
use svcplus_domain::{ModuleId, ProjectKind, TestKind};
use svcplus_shared::ErrorCode;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn temp_root(label: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    std::env::temp_dir().join(format!("svcplus-scaffold-{label}-{nanos}"))
}

fn embedded_deps() -> ScaffoldDeps {
    ScaffoldDeps {
        templates: Arc::new(EmbeddedTemplateStore::new()),
        writer: Arc::new(LocalArtifactWriter::new()),
    }
}

#[test]
fn init_writes_a_manifest_that_resolves() -> TestResult {
    let root = temp_root("init");
    let output = init_project(
        &embedded_deps(),
        InitProjectInput {
            directory: root.clone(),
            kind: ProjectKind::Http,
            on_progress: None,
        },
    )?;
    assert!(output.created_directory);
    assert!(root.join("http_demo.py").is_file());
    assert!(root.join("config.yml").is_file());

    let resolver = ManifestModuleResolver::new(&root);
    let bindings = discover_bindings(
        &resolver,
        &ModuleId::parse("http_demo")?,
        &parse_class_list("HttpDemoService")?,
    )?;
    assert_eq!(bindings.len(), 3);

    std::fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn init_refuses_non_empty_directory() -> TestResult {
    let root = temp_root("busy");
    std::fs::create_dir_all(&root)?;
    std::fs::write(root.join("keep.txt"), "mine")?;

    let result = init_project(
        &embedded_deps(),
        InitProjectInput {
            directory: root.clone(),
            kind: ProjectKind::All,
            on_progress: None,
        },
    );
    assert_eq!(
        result.err().map(|error| error.code),
        Some(ErrorCode::new("scaffold", "destination_not_empty"))
    );
    assert_eq!(std::fs::read_dir(&root)?.count(), 1);

    std::fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn test_gen_overwrites_existing_files() -> TestResult {
    let root = temp_root("tests");
    init_project(
        &embedded_deps(),
        InitProjectInput {
            directory: root.clone(),
            kind: ProjectKind::Rpc,
            on_progress: None,
        },
    )?;
    let target = root.join("test_service.py");
    std::fs::write(&target, "stale")?;

    let output = generate_tests(
        &embedded_deps(),
        GenerateTestsInput {
            directory: root.clone(),
            kind: TestKind::Unit,
            on_progress: None,
        },
    )?;
    assert!(output.files.contains(&target));
    assert_ne!(std::fs::read_to_string(&target)?, "stale");

    std::fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn directory_templates_skip_build_caches() -> TestResult {
    let templates = temp_root("templates");
    let kind_dir = templates.join("timer");
    std::fs::create_dir_all(kind_dir.join("__pycache__"))?;
    std::fs::write(kind_dir.join("timer_demo.py"), "print('tick')")?;
    std::fs::write(kind_dir.join("__pycache__").join("timer_demo.pyc"), "x")?;

    let destination = temp_root("from-dir");
    let output = init_project(
        &ScaffoldDeps {
            templates: Arc::new(DirectoryTemplateStore::new(&templates)),
            writer: Arc::new(LocalArtifactWriter::new()),
        },
        InitProjectInput {
            directory: destination.clone(),
            kind: ProjectKind::Timer,
            on_progress: None,
        },
    )?;
    assert_eq!(output.files, vec![destination.join("timer_demo.py")]);
    assert!(!destination.join("__pycache__").exists());

    std::fs::remove_dir_all(&templates)?;
    std::fs::remove_dir_all(&destination)?;
    Ok(())
}
