//! Local filesystem artifact writer.

use std::path::Path;
use svcplus_ports::{ArtifactWriterPort, DirState};
use svcplus_shared::{Result, io_error_at};

/// Writes artifacts to the local filesystem with blocking IO.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalArtifactWriter;

impl LocalArtifactWriter {
    /// Build a local writer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ArtifactWriterPort for LocalArtifactWriter {
    fn dir_state(&self, path: &Path) -> Result<DirState> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(DirState::Missing);
            },
            Err(error) => return Err(io_error_at(path, error)),
        };
        if !metadata.is_dir() {
            return Ok(DirState::NotADirectory);
        }

        let mut entries = std::fs::read_dir(path).map_err(|error| io_error_at(path, error))?;
        if entries.next().is_some() {
            Ok(DirState::NonEmpty)
        } else {
            Ok(DirState::Empty)
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path).map_err(|error| io_error_at(path, error))
    }

    fn write_bytes(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|error| io_error_at(parent, error))?;
            }
        }
        std::fs::write(path, contents).map_err(|error| io_error_at(path, error))?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote artifact");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use svcplus_domain::TextEncoding;
    use svcplus_shared::ErrorCode;

    fn temp_root(label: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos());
        std::env::temp_dir().join(format!("svcplus-fs-{label}-{nanos}"))
    }

    #[test]
    fn dir_state_tracks_directory_contents() -> Result<()> {
        let writer = LocalArtifactWriter::new();
        let root = temp_root("state");
        assert_eq!(writer.dir_state(&root)?, DirState::Missing);

        writer.create_dir_all(&root)?;
        assert_eq!(writer.dir_state(&root)?, DirState::Empty);

        let file = root.join("a.txt");
        writer.write_bytes(&file, b"a")?;
        assert_eq!(writer.dir_state(&root)?, DirState::NonEmpty);
        assert_eq!(writer.dir_state(&file)?, DirState::NotADirectory);

        std::fs::remove_dir_all(&root)?;
        Ok(())
    }

    #[test]
    fn write_text_creates_parents_and_overwrites() -> Result<()> {
        let writer = LocalArtifactWriter::new();
        let root = temp_root("write");
        let path = root.join("nested").join("out.yml");

        writer.write_text(&path, "first", TextEncoding::Utf8)?;
        writer.write_text(&path, "second", TextEncoding::Ascii)?;
        assert_eq!(std::fs::read_to_string(&path)?, "second");

        std::fs::remove_dir_all(&root)?;
        Ok(())
    }

    #[test]
    fn unencodable_text_is_not_written() -> Result<()> {
        let writer = LocalArtifactWriter::new();
        let root = temp_root("ascii");
        let path = root.join("dash.json");

        let Err(error) = writer.write_text(&path, "caf\u{e9}", TextEncoding::Ascii) else {
            return Ok(());
        };
        assert_eq!(error.code, ErrorCode::encoding_failed());
        assert!(!path.exists());
        Ok(())
    }
}
