//! Environment validation helpers for CLI surfaces.

use std::collections::BTreeMap;
use svcplus_config::{SvcplusConfig, SvcplusEnv, apply_env_overrides};
use svcplus_shared::ErrorEnvelope;

/// Infra-level error type (shared error envelope).
pub type InfraError = ErrorEnvelope;

/// Infra-level result type.
pub type InfraResult<T> = Result<T, InfraError>;

/// Validate that `SVCPLUS_*` overrides parse and merge into a valid config.
pub fn validate_env_parsing(env: &BTreeMap<String, String>) -> InfraResult<()> {
    let parsed = SvcplusEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    apply_env_overrides(SvcplusConfig::default(), &parsed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_delay_is_rejected() {
        let env = BTreeMap::from([(
            "SVCPLUS_DOCKER_STEP_DELAY_MS".to_owned(),
            "soon".to_owned(),
        )]);
        assert!(validate_env_parsing(&env).is_err());
        assert!(validate_env_parsing(&BTreeMap::new()).is_ok());
    }
}
