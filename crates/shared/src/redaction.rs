//! Secret detection and redaction utilities.
//!
//! Broker credentials travel through config and into container invocations;
//! these helpers keep them out of rendered config dumps and error output.

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Checks if a key/variable name likely refers to a secret.
///
/// ```
/// use svcplus_shared::is_secret_key;
///
/// assert!(is_secret_key("password"));
/// assert!(is_secret_key("SVCPLUS_RABBITMQ_PASSWORD"));
/// assert!(!is_secret_key("SVCPLUS_DOCKER_NETWORK"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    key.contains("PASSWORD")
        || key.contains("SECRET")
        || key.contains("TOKEN")
        || key.contains("CREDENTIAL")
        || key.ends_with("_KEY")
        || key == "KEY"
}

/// Redacts a value if the key is likely a secret.
///
/// ```
/// use svcplus_shared::redact_if_secret;
///
/// assert_eq!(redact_if_secret("password", "guest"), "[REDACTED]");
/// assert_eq!(redact_if_secret("user", "guest"), "guest");
/// ```
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

/// A secret string wrapper that redacts on Display/Debug.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SecretString(Box<str>);

impl SecretString {
    /// Wrap a secret value.
    pub fn new(value: impl Into<Box<str>>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying secret.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value.into_boxed_str())
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl serde::Serialize for SecretString {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for SecretString {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_secret_patterns() {
        assert!(is_secret_key("password"));
        assert!(is_secret_key("SVCPLUS_RABBITMQ_PASSWORD"));
        assert!(is_secret_key("client_secret"));
        assert!(is_secret_key("ACCESS_TOKEN"));
        assert!(is_secret_key("API_KEY"));
    }

    #[test]
    fn rejects_non_secret_patterns() {
        assert!(!is_secret_key("user"));
        assert!(!is_secret_key("SVCPLUS_DOCKER_STEP_DELAY_MS"));
        assert!(!is_secret_key("mappingPath"));
        assert!(!is_secret_key("KEYBOARD_LAYOUT"));
    }

    #[test]
    fn secret_string_redacts_display_and_debug() {
        let secret = SecretString::new("guest");
        assert_eq!(secret.to_string(), REDACTED);
        assert_eq!(format!("{secret:?}"), REDACTED);
        assert_eq!(secret.expose(), "guest");
    }

    #[test]
    fn secret_string_round_trips_through_serde() -> Result<(), Box<dyn std::error::Error>> {
        let secret: SecretString = serde_json::from_str("\"s3cret\"")?;
        assert_eq!(secret.expose(), "s3cret");
        assert_eq!(serde_json::to_string(&secret)?, "\"s3cret\"");
        Ok(())
    }
}
