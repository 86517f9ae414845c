use std::time::Duration;

use ms_config::{EnvSource, ProcessEnv};

use crate::error::AuthResult;

pub const ENV_AUTH_ISSUER: &str = "AUTH_ISSUER";
pub const ENV_AUTH_AUDIENCE: &str = "AUTH_AUDIENCE";

/// Audience (client id) tokens must be issued for unless overridden.
pub const DEFAULT_AUDIENCE: &str = "account";

/// Runtime configuration for OIDC token verification.
#[derive(Debug, Clone)]
pub struct OidcConfig {
    /// Issuer URL; discovery is performed against it and tokens must carry it as `iss`.
    pub issuer: String,
    /// Expected audience claim (aud).
    pub audience: String,
    /// Allowable clock skew in seconds when validating exp/nbf.
    pub leeway_seconds: u32,
    /// Timeout applied to discovery and JWKS requests.
    pub http_timeout: Duration,
    /// Minimum spacing between JWKS refreshes triggered by an unknown `kid`.
    pub jwks_refresh_interval: Duration,
}

impl OidcConfig {
    /// Construct config with sensible defaults (30 second leeway, 10 second HTTP timeout,
    /// at most one unknown-`kid` JWKS refresh every 10 seconds).
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            leeway_seconds: 30,
            http_timeout: Duration::from_secs(10),
            jwks_refresh_interval: Duration::from_secs(10),
        }
    }

    /// Reads `AUTH_ISSUER` (required) and `AUTH_AUDIENCE` (default `account`).
    pub fn from_env(env: &impl EnvSource) -> AuthResult<Self> {
        let issuer = env.required(ENV_AUTH_ISSUER)?;
        let audience = env.optional(ENV_AUTH_AUDIENCE, DEFAULT_AUDIENCE);
        Ok(Self::new(issuer, audience))
    }

    pub fn from_process_env() -> AuthResult<Self> {
        Self::from_env(&ProcessEnv)
    }

    /// Adjust the allowed leeway.
    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_jwks_refresh_interval(mut self, interval: Duration) -> Self {
        self.jwks_refresh_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AuthError, ErrorKind};
    use std::collections::HashMap;

    #[test]
    fn from_env_applies_default_audience() {
        let env = HashMap::from([(
            "AUTH_ISSUER".to_string(),
            "https://idp.example/realms/main".to_string(),
        )]);
        let config = OidcConfig::from_env(&env).expect("config");
        assert_eq!(config.issuer, "https://idp.example/realms/main");
        assert_eq!(config.audience, "account");
        assert_eq!(config.leeway_seconds, 30);
        assert_eq!(config.jwks_refresh_interval, Duration::from_secs(10));
    }

    #[test]
    fn from_env_requires_issuer() {
        let env = HashMap::from([("AUTH_AUDIENCE".to_string(), "billing".to_string())]);
        let err = OidcConfig::from_env(&env).expect_err("issuer required");
        assert!(matches!(err, AuthError::Config(_)));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
