//! Domain primitives with validated constructors.

use serde::{Deserialize, Serialize};
use std::fmt;
use svcplus_shared::{ErrorCode, ErrorEnvelope};
use thiserror::Error;

/// Validation failures for domain primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimitiveError {
    /// `ModuleId` is empty after trimming.
    #[error("module id must be non-empty")]
    EmptyModuleId {
        /// Length of the raw input before trimming.
        input_length: usize,
    },
    /// `ModuleId` has an empty or non-identifier segment.
    #[error("module id must be a dotted path of identifiers")]
    InvalidModuleId {
        /// Trimmed module id that failed validation.
        input: String,
    },
    /// `ClassName` is empty or not an identifier.
    #[error("class name must match /^[A-Za-z_][A-Za-z0-9_]*$/")]
    InvalidClassName {
        /// Trimmed class name that failed validation.
        input: String,
    },
    /// `MethodName` is empty or not an identifier.
    #[error("method name must match /^[A-Za-z_][A-Za-z0-9_]*$/")]
    InvalidMethodName {
        /// Trimmed method name that failed validation.
        input: String,
    },
    /// `StatsdPrefix` is empty after trimming or contains whitespace.
    #[error("statsd prefix must be non-empty and contain no whitespace")]
    InvalidStatsdPrefix {
        /// Raw prefix input.
        input: String,
    },
    /// `StatName` is empty after trimming or contains whitespace.
    #[error("stat name must be non-empty and contain no whitespace")]
    InvalidStatName {
        /// Raw stat name input.
        input: String,
    },
}

impl PrimitiveError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyModuleId { .. } | Self::InvalidModuleId { .. } => {
                ErrorCode::new("domain", "invalid_module_id")
            },
            Self::InvalidClassName { .. } => ErrorCode::new("domain", "invalid_class_name"),
            Self::InvalidMethodName { .. } => ErrorCode::new("domain", "invalid_method_name"),
            Self::InvalidStatsdPrefix { .. } => ErrorCode::new("domain", "invalid_statsd_prefix"),
            Self::InvalidStatName { .. } => ErrorCode::new("domain", "invalid_stat_name"),
        }
    }
}

impl From<PrimitiveError> for ErrorEnvelope {
    fn from(error: PrimitiveError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            PrimitiveError::EmptyModuleId { input_length } => {
                envelope.with_metadata("input_length", input_length.to_string())
            },
            PrimitiveError::InvalidModuleId { input }
            | PrimitiveError::InvalidClassName { input }
            | PrimitiveError::InvalidMethodName { input }
            | PrimitiveError::InvalidStatsdPrefix { input }
            | PrimitiveError::InvalidStatName { input } => envelope.with_metadata("input", input),
        }
    }
}

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Box<str>);

        impl $name {
            /// Access the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str(self.as_str())
            }
        }

        impl TryFrom<String> for $name {
            type Error = PrimitiveError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0.into_string()
            }
        }
    };
}

string_newtype!(
    /// Dotted path naming a service module (`pkg.sub.module`).
    ModuleId
);

impl ModuleId {
    /// Parse a module id; every dot-separated segment must be an identifier.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PrimitiveError::EmptyModuleId {
                input_length: raw.len(),
            });
        }
        if !trimmed.split('.').all(is_identifier) {
            return Err(PrimitiveError::InvalidModuleId {
                input: trimmed.to_owned(),
            });
        }
        Ok(Self(trimmed.into()))
    }

    /// Iterate over the dot-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

string_newtype!(
    /// Name of a service class inside a module.
    ClassName
);

impl ClassName {
    /// Parse a class name (trimmed, identifier syntax).
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let trimmed = input.as_ref().trim();
        if !is_identifier(trimmed) {
            return Err(PrimitiveError::InvalidClassName {
                input: trimmed.to_owned(),
            });
        }
        Ok(Self(trimmed.into()))
    }
}

string_newtype!(
    /// Name of a method on a service class.
    MethodName
);

impl MethodName {
    /// Parse a method name (trimmed, identifier syntax).
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let trimmed = input.as_ref().trim();
        if !is_identifier(trimmed) {
            return Err(PrimitiveError::InvalidMethodName {
                input: trimmed.to_owned(),
            });
        }
        Ok(Self(trimmed.into()))
    }
}

string_newtype!(
    /// Metrics namespace configured on a statsd client.
    StatsdPrefix
);

impl StatsdPrefix {
    /// Parse a prefix; surrounding whitespace is trimmed, the rest must be `[A-Za-z0-9_.-]`.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let trimmed = raw.trim();
        if !is_metric_token(trimmed) {
            return Err(PrimitiveError::InvalidStatsdPrefix {
                input: raw.to_owned(),
            });
        }
        Ok(Self(trimmed.into()))
    }
}

string_newtype!(
    /// Leaf metric name declared by a timer.
    StatName
);

impl StatName {
    /// Parse a stat name; surrounding whitespace is trimmed, the rest must be `[A-Za-z0-9_.-]`.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let trimmed = raw.trim();
        if !is_metric_token(trimmed) {
            return Err(PrimitiveError::InvalidStatName {
                input: raw.to_owned(),
            });
        }
        Ok(Self(trimmed.into()))
    }
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Statsd exporter metric charset; `*` would turn a mapping rule into a glob.
fn is_metric_token(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_id_accepts_dotted_identifiers() -> Result<(), PrimitiveError> {
        let module = ModuleId::parse(" demo.rpc_demo ")?;
        assert_eq!(module.as_str(), "demo.rpc_demo");
        assert_eq!(module.segments().collect::<Vec<_>>(), ["demo", "rpc_demo"]);
        Ok(())
    }

    #[test]
    fn module_id_rejects_empty_segments() {
        assert!(matches!(
            ModuleId::parse("demo..rpc"),
            Err(PrimitiveError::InvalidModuleId { .. })
        ));
        assert!(matches!(
            ModuleId::parse("../etc/passwd"),
            Err(PrimitiveError::InvalidModuleId { .. })
        ));
        assert!(matches!(
            ModuleId::parse("   "),
            Err(PrimitiveError::EmptyModuleId { input_length: 3 })
        ));
    }

    #[test]
    fn class_name_is_trimmed_identifier() -> Result<(), PrimitiveError> {
        assert_eq!(ClassName::parse(" A ")?.as_str(), "A");
        assert!(ClassName::parse("").is_err());
        assert!(ClassName::parse("1Service").is_err());
        assert!(ClassName::parse("My-Service").is_err());
        Ok(())
    }

    #[test]
    fn stat_tokens_reject_inner_whitespace() -> Result<(), PrimitiveError> {
        assert_eq!(StatName::parse("hello")?.as_str(), "hello");
        assert_eq!(StatsdPrefix::parse("svc.a")?.as_str(), "svc.a");
        assert!(StatName::parse("he llo").is_err());
        assert!(StatsdPrefix::parse(" ").is_err());
        Ok(())
    }

    #[test]
    fn stat_tokens_reject_glob_and_quote_characters() -> Result<(), PrimitiveError> {
        assert_eq!(StatsdPrefix::parse("svc-a.v2_x")?.as_str(), "svc-a.v2_x");
        assert!(matches!(
            StatsdPrefix::parse("svc*"),
            Err(PrimitiveError::InvalidStatsdPrefix { .. })
        ));
        assert!(matches!(
            StatName::parse("he\"llo"),
            Err(PrimitiveError::InvalidStatName { .. })
        ));
        assert!(matches!(
            StatName::parse("a{b}"),
            Err(PrimitiveError::InvalidStatName { .. })
        ));
        Ok(())
    }

    #[test]
    fn primitive_errors_map_into_error_envelopes() {
        let Err(error) = ClassName::parse("bad-name") else {
            return;
        };
        let envelope: ErrorEnvelope = error.into();
        assert_eq!(envelope.code.namespace(), "domain");
        assert_eq!(envelope.code.code(), "invalid_class_name");
        assert_eq!(
            envelope.metadata.get("input").map(String::as_str),
            Some("bad-name")
        );
    }

    #[test]
    fn newtypes_deserialize_with_validation() -> Result<(), Box<dyn std::error::Error>> {
        let name: ClassName = serde_json::from_str("\"Greeter\"")?;
        assert_eq!(name.as_str(), "Greeter");
        assert!(serde_json::from_str::<ClassName>("\"not valid\"").is_err());
        Ok(())
    }
}
