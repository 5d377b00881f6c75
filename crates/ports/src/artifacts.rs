//! Artifact writer boundary contract.

use std::path::Path;
use svcplus_domain::TextEncoding;
use svcplus_shared::{ErrorCode, ErrorEnvelope, Result};

/// A validated, normalized path relative to a destination root.
///
/// Rejects absolute paths and traversal (`..` segments).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SafeRelativePath(Box<str>);

impl SafeRelativePath {
    /// Validate and normalize an untrusted relative path.
    pub fn new(input: &str) -> Result<Self> {
        let normalized = normalize_relative_path(input)?;
        Ok(Self(normalized.into_boxed_str()))
    }

    /// Borrow the path as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the `/`-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

fn normalize_relative_path(input: &str) -> Result<String> {
    let replaced = input.trim().replace('\\', "/");
    let collapsed = collapse_forward_slashes(&replaced);
    if is_absolute_like(&collapsed) {
        return Err(invalid_path(input, "absolute paths are not allowed"));
    }
    let collapsed = collapsed.trim_start_matches("./").trim_matches('/');

    if collapsed.is_empty() || collapsed == "." {
        return Err(invalid_path(input, "path must name a file"));
    }
    if collapsed.split('/').any(|segment| segment == "..") {
        return Err(invalid_path(input, "path traversal is not allowed"));
    }

    Ok(collapsed.to_owned())
}

fn invalid_path(input: &str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope::expected(ErrorCode::invalid_input(), message).with_metadata("path", input)
}

fn is_absolute_like(path: &str) -> bool {
    if path.starts_with('/') {
        return true;
    }
    let bytes = path.as_bytes();
    matches!(bytes, [drive, b':', b'/', ..] if drive.is_ascii_alphabetic())
}

fn collapse_forward_slashes(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut previous_was_slash = false;

    for ch in input.chars() {
        if ch == '/' {
            if previous_was_slash {
                continue;
            }
            previous_was_slash = true;
        } else {
            previous_was_slash = false;
        }
        output.push(ch);
    }

    output
}

/// Observed state of a destination directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirState {
    /// Nothing exists at the path.
    Missing,
    /// Directory with no entries.
    Empty,
    /// Directory with at least one entry.
    NonEmpty,
    /// Something other than a directory exists at the path.
    NotADirectory,
}

/// Boundary contract for writing generated artifacts.
pub trait ArtifactWriterPort: Send + Sync {
    /// Inspect a destination directory.
    fn dir_state(&self, path: &Path) -> Result<DirState>;

    /// Create a directory and its parents.
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Write bytes, creating parent directories and replacing existing content.
    fn write_bytes(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Encode and write text.
    ///
    /// Text that the encoding cannot represent fails with
    /// `render:encoding_failed` before anything is written.
    fn write_text(&self, path: &Path, text: &str, encoding: TextEncoding) -> Result<()> {
        let bytes = encoding.encode(text).map_err(|error| {
            ErrorEnvelope::expected(ErrorCode::encoding_failed(), error.to_string())
                .with_metadata("path", path.to_string_lossy().to_string())
                .with_metadata("encoding", encoding.as_str())
        })?;
        self.write_bytes(path, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_relative_path_normalizes_separators() -> Result<()> {
        let path = SafeRelativePath::new(".//tests\\unit//test_service.py")?;
        assert_eq!(path.as_str(), "tests/unit/test_service.py");
        assert_eq!(path.segments().count(), 3);
        Ok(())
    }

    #[test]
    fn safe_relative_path_rejects_escape() {
        assert!(SafeRelativePath::new("../outside").is_err());
        assert!(SafeRelativePath::new("/etc/passwd").is_err());
        assert!(SafeRelativePath::new("C:/windows").is_err());
        assert!(SafeRelativePath::new("./").is_err());
    }
}
