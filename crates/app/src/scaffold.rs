//! Project and test scaffolding from template sets.

use crate::progress::{Progress, ProgressSink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use svcplus_domain::{ProjectKind, TemplateFile, TemplateSet, TestKind};
use svcplus_ports::{ArtifactWriterPort, DirState, SafeRelativePath, TemplateStorePort};
use svcplus_shared::{ErrorCode, ErrorEnvelope, Result};

/// Dependencies required by the scaffolders.
#[derive(Clone)]
pub struct ScaffoldDeps {
    /// Template source.
    pub templates: Arc<dyn TemplateStorePort>,
    /// Artifact writer.
    pub writer: Arc<dyn ArtifactWriterPort>,
}

/// Input payload for `init`.
#[derive(Clone)]
pub struct InitProjectInput {
    /// Destination directory (absolute).
    pub directory: PathBuf,
    /// Project template kind.
    pub kind: ProjectKind,
    /// Optional progress callback.
    pub on_progress: Option<ProgressSink>,
}

/// Input payload for `test-gen`.
#[derive(Clone)]
pub struct GenerateTestsInput {
    /// Existing, non-empty project directory (absolute).
    pub directory: PathBuf,
    /// Test template kind.
    pub kind: TestKind,
    /// Optional progress callback.
    pub on_progress: Option<ProgressSink>,
}

/// Files written by a scaffolding run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldOutput {
    /// Destination directory.
    pub directory: PathBuf,
    /// Whether the destination was created by this run.
    pub created_directory: bool,
    /// Written files, in template order.
    pub files: Vec<PathBuf>,
}

/// Create a project skeleton of `input.kind` in `input.directory`.
///
/// The destination must be missing or empty.
pub fn init_project(deps: &ScaffoldDeps, input: InitProjectInput) -> Result<ScaffoldOutput> {
    let progress = Progress::new(input.on_progress);
    let directory = input.directory;

    let state = deps.writer.dir_state(&directory)?;
    match state {
        DirState::Missing | DirState::Empty => {},
        DirState::NonEmpty => {
            return Err(ErrorEnvelope::expected(
                ErrorCode::new("scaffold", "destination_not_empty"),
                format!("{} is not empty", directory.display()),
            )
            .with_metadata("directory", directory.to_string_lossy().to_string()));
        },
        DirState::NotADirectory => return Err(not_a_directory(&directory)),
    }

    let files = load_templates(deps.templates.as_ref(), TemplateSet::Project(input.kind))?;

    let created_directory = state == DirState::Missing;
    if created_directory {
        progress.step(
            &format!("Creating directory '{}'", directory.display()),
            || deps.writer.create_dir_all(&directory),
        )?;
    }

    let written = write_templates(deps.writer.as_ref(), &progress, &directory, &files)?;
    tracing::info!(
        directory = %directory.display(),
        kind = input.kind.as_str(),
        files = written.len(),
        "project initialized"
    );
    Ok(ScaffoldOutput {
        directory,
        created_directory,
        files: written,
    })
}

/// Write test skeleton files of `input.kind` into an existing project.
///
/// Same-name files are overwritten.
pub fn generate_tests(deps: &ScaffoldDeps, input: GenerateTestsInput) -> Result<ScaffoldOutput> {
    let progress = Progress::new(input.on_progress);
    let directory = input.directory;

    match deps.writer.dir_state(&directory)? {
        DirState::NonEmpty => {},
        DirState::Missing | DirState::Empty => {
            return Err(ErrorEnvelope::expected(
                ErrorCode::new("scaffold", "destination_missing"),
                format!(
                    "{} does not exist or is empty; run init first",
                    directory.display()
                ),
            )
            .with_metadata("directory", directory.to_string_lossy().to_string()));
        },
        DirState::NotADirectory => return Err(not_a_directory(&directory)),
    }

    let files = load_templates(deps.templates.as_ref(), TemplateSet::Tests(input.kind))?;
    let written = write_templates(deps.writer.as_ref(), &progress, &directory, &files)?;
    tracing::info!(
        directory = %directory.display(),
        kind = input.kind.as_str(),
        files = written.len(),
        "tests generated"
    );
    Ok(ScaffoldOutput {
        directory,
        created_directory: false,
        files: written,
    })
}

fn load_templates(store: &dyn TemplateStorePort, set: TemplateSet) -> Result<Vec<TemplateFile>> {
    let files = store.template_files(set)?;
    if files.is_empty() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::new("scaffold", "unknown_template"),
            format!("template set {set} has no files"),
        )
        .with_metadata("template", set.to_string())
        .with_metadata("source", store.describe()));
    }
    tracing::debug!(
        template = %set,
        files = files.len(),
        source = %store.describe(),
        "loaded templates"
    );
    Ok(files)
}

fn write_templates(
    writer: &dyn ArtifactWriterPort,
    progress: &Progress,
    directory: &Path,
    files: &[TemplateFile],
) -> Result<Vec<PathBuf>> {
    let targets = files
        .iter()
        .map(|file| {
            let relative = SafeRelativePath::new(&file.relative_path)?;
            let target = relative
                .segments()
                .fold(directory.to_path_buf(), |path, segment| path.join(segment));
            Ok((target, file))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut written = Vec::with_capacity(targets.len());
    for (target, file) in targets {
        progress.step(&format!("Generating {}", target.display()), || {
            writer.write_bytes(&target, &file.contents)
        })?;
        written.push(target);
    }
    Ok(written)
}

fn not_a_directory(path: &Path) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::invalid_input(),
        format!("{} is not a directory", path.display()),
    )
    .with_metadata("directory", path.to_string_lossy().to_string())
}
