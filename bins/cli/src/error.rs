//! Exit codes, CLI-level errors and the error payload printed to users.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use svcplus_shared::{ErrorCode, ErrorEnvelope, ErrorKind, REDACTED_VALUE, is_secret_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    InvalidInput = 2,
    Io = 3,
    Internal = 1,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Exit code for a failed use case.
    #[must_use]
    pub fn for_envelope(error: &ErrorEnvelope) -> Self {
        match error.kind {
            ErrorKind::Expected => Self::InvalidInput,
            ErrorKind::Invariant => Self::Internal,
            ErrorKind::Unexpected if is_io_code(&error.code) => Self::Io,
            ErrorKind::Unexpected => Self::Internal,
        }
    }
}

fn is_io_code(code: &ErrorCode) -> bool {
    *code == ErrorCode::io()
        || *code == ErrorCode::not_found()
        || *code == ErrorCode::permission_denied()
}

#[derive(Debug)]
pub enum CliError {
    InvalidInput(String),
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::Io(_) => ExitCode::Io,
            Self::Serialization(_) => ExitCode::Internal,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(formatter, "invalid input: {message}"),
            Self::Io(error) => write!(formatter, "io error: {error}"),
            Self::Serialization(error) => write!(formatter, "serialization error: {error}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error)
    }
}

/// Error payload printed by every output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDto {
    /// `namespace:code`.
    pub code: String,
    pub message: String,
    /// `EXPECTED`, `INVARIANT` or `UNEXPECTED`.
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<BTreeMap<String, String>>,
}

impl ErrorDto {
    /// Build the payload with secret metadata values redacted.
    #[must_use]
    pub fn from_envelope(error: &ErrorEnvelope) -> Self {
        let meta: BTreeMap<String, String> = error
            .metadata
            .iter()
            .map(|(key, value)| {
                let value = if is_secret_key(key) {
                    REDACTED_VALUE.to_owned()
                } else {
                    value.clone()
                };
                (key.clone(), value)
            })
            .collect();
        Self {
            code: error.code.to_string(),
            message: error.message.clone(),
            kind: match error.kind {
                ErrorKind::Expected => "EXPECTED",
                ErrorKind::Invariant => "INVARIANT",
                ErrorKind::Unexpected => "UNEXPECTED",
            },
            meta: (!meta.is_empty()).then_some(meta),
        }
    }

    /// `key: value` rendering.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = format!(
            "status: error\ncode: {}\nmessage: {}\nkind: {}\n",
            self.code, self.message, self.kind
        );
        if let Some(meta) = self.meta.as_ref() {
            out.push_str("meta:\n");
            for (key, value) in meta {
                out.push_str("  ");
                out.push_str(key);
                out.push_str(": ");
                out.push_str(value);
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svcplus_shared::ErrorClass;

    #[test]
    fn exit_codes_follow_error_kind() {
        let expected = ErrorEnvelope::expected(ErrorCode::module_not_found(), "missing");
        let io = ErrorEnvelope::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        let tool = ErrorEnvelope::unexpected(
            ErrorCode::new("container", "command_failed"),
            "exit 1",
            ErrorClass::NonRetriable,
        );
        let bug = ErrorEnvelope::invariant(ErrorCode::internal(), "bug");

        assert_eq!(ExitCode::for_envelope(&expected), ExitCode::InvalidInput);
        assert_eq!(ExitCode::for_envelope(&io), ExitCode::Io);
        assert_eq!(ExitCode::for_envelope(&tool), ExitCode::Internal);
        assert_eq!(ExitCode::for_envelope(&bug), ExitCode::Internal);
    }

    #[test]
    fn dto_redacts_secret_metadata() {
        let error = ErrorEnvelope::expected(ErrorCode::invalid_input(), "bad value")
            .with_metadata("password", "guest")
            .with_metadata("field", "rabbitmq.user");
        let dto = ErrorDto::from_envelope(&error);
        let meta = dto.meta.unwrap_or_default();
        assert_eq!(meta.get("password").map(String::as_str), Some(REDACTED_VALUE));
        assert_eq!(meta.get("field").map(String::as_str), Some("rabbitmq.user"));
    }

    #[test]
    fn text_rendering_lists_metadata() {
        let error = ErrorEnvelope::expected(ErrorCode::class_not_found(), "no class Foo")
            .with_metadata("class", "Foo");
        let text = ErrorDto::from_envelope(&error).to_text();
        assert_eq!(
            text,
            "status: error\ncode: module:class_not_found\nmessage: no class Foo\nkind: EXPECTED\nmeta:\n  class: Foo\n"
        );
    }
}
