//! Error envelope types and helpers.
//!
//! Every fallible svcplus operation reports an [`ErrorEnvelope`]: a stable,
//! namespaced [`ErrorCode`], an origin [`ErrorKind`], a retry [`ErrorClass`],
//! and string metadata (offending identifiers, paths, template names).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::{fmt, io};

/// Metadata attached to errors for diagnostics.
pub type ErrorMetadata = BTreeMap<String, String>;

/// Redacted placeholder value for sensitive metadata.
pub const REDACTED_VALUE: &str = "<redacted>";

/// High-level classification of error origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Expected failures (bad flags, unresolvable modules, non-empty targets).
    Expected,
    /// Invariant violations (bugs).
    Invariant,
    /// Unexpected failures (I/O, external tools).
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected => formatter.write_str("expected"),
            Self::Invariant => formatter.write_str("invariant"),
            Self::Unexpected => formatter.write_str("unexpected"),
        }
    }
}

/// Retry classification for failure handling.
///
/// svcplus never retries on its own; the class tells the operator whether
/// re-running the same command may succeed without changing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Re-running may succeed.
    Retriable,
    /// Re-running will fail the same way until the cause is fixed.
    NonRetriable,
}

impl ErrorClass {
    /// Returns true when the error is considered retriable.
    #[must_use]
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::Retriable)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retriable => formatter.write_str("retriable"),
            Self::NonRetriable => formatter.write_str("non-retriable"),
        }
    }
}

/// Stable error code with namespace and identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode {
    namespace: String,
    code: String,
}

impl ErrorCode {
    /// Create a new error code with a namespace and code.
    pub fn new(namespace: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            code: code.into(),
        }
    }

    /// Invalid input code.
    pub fn invalid_input() -> Self {
        Self::new("core", "invalid_input")
    }

    /// Not found code.
    pub fn not_found() -> Self {
        Self::new("core", "not_found")
    }

    /// Permission denied code.
    pub fn permission_denied() -> Self {
        Self::new("core", "permission_denied")
    }

    /// I/O error code.
    pub fn io() -> Self {
        Self::new("core", "io")
    }

    /// Internal failure code.
    pub fn internal() -> Self {
        Self::new("core", "internal")
    }

    /// Requested module does not resolve.
    pub fn module_not_found() -> Self {
        Self::new("module", "not_found")
    }

    /// Requested class is not part of the resolved module.
    pub fn class_not_found() -> Self {
        Self::new("module", "class_not_found")
    }

    /// Module manifest exists but cannot be parsed or is inconsistent.
    pub fn invalid_manifest() -> Self {
        Self::new("module", "invalid_manifest")
    }

    /// Document serialization failed.
    pub fn render_failed() -> Self {
        Self::new("render", "serialize_failed")
    }

    /// Rendered text cannot be represented in the requested encoding.
    pub fn encoding_failed() -> Self {
        Self::new("render", "encoding_failed")
    }

    /// Returns the namespace portion.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the code identifier.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.namespace, self.code)
    }
}

/// Structured error envelope shared across crates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error kind describing the origin category.
    pub kind: ErrorKind,
    /// Retry classification.
    pub class: ErrorClass,
    /// Stable error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Additional diagnostic metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: ErrorMetadata,
}

impl ErrorEnvelope {
    /// Create an expected, non-retriable error.
    pub fn expected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Expected,
            class: ErrorClass::NonRetriable,
            code,
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Create an invariant error (always non-retriable).
    pub fn invariant(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Invariant,
            class: ErrorClass::NonRetriable,
            code,
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Create an unexpected error with the provided retry classification.
    pub fn unexpected(code: ErrorCode, message: impl Into<String>, class: ErrorClass) -> Self {
        Self {
            kind: ErrorKind::Unexpected,
            class,
            code,
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a single metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Replace metadata with a redacted copy for the provided keys.
    #[must_use]
    pub fn redact_metadata(self, keys: &[&str]) -> Self {
        Self {
            metadata: redact_metadata(self.metadata, keys),
            ..self
        }
    }

    /// Returns true when the error is an operator-facing expected failure.
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        matches!(self.kind, ErrorKind::Expected)
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} {} {}: {}",
            self.kind, self.class, self.code, self.message
        )
    }
}

impl std::error::Error for ErrorEnvelope {}

impl From<io::Error> for ErrorEnvelope {
    fn from(error: io::Error) -> Self {
        let kind = error.kind();
        let class = if is_retriable_io(kind) {
            ErrorClass::Retriable
        } else {
            ErrorClass::NonRetriable
        };
        Self::unexpected(error_code_from_io_kind(kind), error.to_string(), class)
    }
}

/// Convert an I/O failure into an envelope tagged with the path it hit.
pub fn io_error_at(path: &Path, error: io::Error) -> ErrorEnvelope {
    ErrorEnvelope::from(error).with_metadata("path", path.to_string_lossy().to_string())
}

/// Redact sensitive metadata values for the provided keys.
#[must_use]
pub fn redact_metadata(mut metadata: ErrorMetadata, keys: &[&str]) -> ErrorMetadata {
    for key in keys {
        if metadata.contains_key(*key) {
            metadata.insert((*key).to_string(), REDACTED_VALUE.to_string());
        }
    }

    metadata
}

fn error_code_from_io_kind(kind: io::ErrorKind) -> ErrorCode {
    match kind {
        io::ErrorKind::NotFound => ErrorCode::not_found(),
        io::ErrorKind::PermissionDenied => ErrorCode::permission_denied(),
        _ => ErrorCode::io(),
    }
}

const fn is_retriable_io(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
            | io::ErrorKind::Interrupted
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_constructors() {
        let expected = ErrorEnvelope::expected(ErrorCode::class_not_found(), "missing");
        assert_eq!(expected.kind, ErrorKind::Expected);
        assert_eq!(expected.class, ErrorClass::NonRetriable);
        assert!(expected.is_expected());

        let invariant = ErrorEnvelope::invariant(ErrorCode::internal(), "boom");
        assert_eq!(invariant.kind, ErrorKind::Invariant);

        let unexpected =
            ErrorEnvelope::unexpected(ErrorCode::io(), "socket", ErrorClass::Retriable);
        assert_eq!(unexpected.kind, ErrorKind::Unexpected);
        assert!(unexpected.class.is_retriable());
    }

    #[test]
    fn io_errors_map_to_core_codes() {
        let not_found = ErrorEnvelope::from(io::Error::new(io::ErrorKind::NotFound, "nope"));
        assert_eq!(not_found.code, ErrorCode::not_found());
        assert!(!not_found.class.is_retriable());

        let denied = ErrorEnvelope::from(io::Error::new(io::ErrorKind::PermissionDenied, "no"));
        assert_eq!(denied.code, ErrorCode::permission_denied());

        let timed_out = ErrorEnvelope::from(io::Error::new(io::ErrorKind::TimedOut, "slow"));
        assert_eq!(timed_out.code, ErrorCode::io());
        assert!(timed_out.class.is_retriable());
    }

    #[test]
    fn io_error_at_records_path() {
        let error = io_error_at(
            Path::new("grafana_dashboards/A_Grafana.json"),
            io::Error::other("disk full"),
        );
        assert_eq!(
            error.metadata.get("path").map(String::as_str),
            Some("grafana_dashboards/A_Grafana.json")
        );
    }

    #[test]
    fn display_includes_code_and_message() {
        let error = ErrorEnvelope::expected(ErrorCode::module_not_found(), "no module demo.x");
        let rendered = error.to_string();
        assert!(rendered.contains("module:not_found"));
        assert!(rendered.contains("no module demo.x"));
    }

    #[test]
    fn metadata_redaction() {
        let error = ErrorEnvelope::expected(ErrorCode::invalid_input(), "bad")
            .with_metadata("password", "guest")
            .with_metadata("path", "value");
        let redacted = error.redact_metadata(&["password"]);

        assert_eq!(
            redacted.metadata.get("password").map(String::as_str),
            Some(REDACTED_VALUE)
        );
        assert_eq!(
            redacted.metadata.get("path").map(String::as_str),
            Some("value")
        );
    }

    #[test]
    fn envelope_serializes_without_empty_metadata() -> Result<(), Box<dyn std::error::Error>> {
        let error = ErrorEnvelope::expected(ErrorCode::render_failed(), "bad yaml");
        let json = serde_json::to_string(&error)?;
        assert!(!json.contains("metadata"));
        Ok(())
    }
}
