use std::sync::Arc;

use ms_config::{EnvSource, ProcessEnv};
use tonic::Request;

use crate::claims::Claims;
use crate::config::OidcConfig;
use crate::error::AuthResult;
use crate::extractors::request_token;
use crate::verifier::TokenVerifier;

pub const ENV_GRPC_PORT: &str = "GRPC_PORT";
pub const DEFAULT_GRPC_PORT: &str = "9090";

/// Listen port plus token verification for one gRPC microservice.
///
/// Clones share a single [`TokenVerifier`], so the identity provider is
/// discovered once per service no matter how many handlers hold a clone.
#[derive(Debug, Clone)]
pub struct BaseServiceServer {
    port: String,
    verifier: Arc<TokenVerifier>,
}

impl BaseServiceServer {
    /// Builds the server from the process environment.
    ///
    /// `AUTH_ISSUER` is required, `AUTH_AUDIENCE` defaults to `account` and
    /// `GRPC_PORT` to `9090`. The identity provider is not contacted here.
    pub fn create() -> AuthResult<Self> {
        Self::from_env(&ProcessEnv)
    }

    pub fn from_env(env: &impl EnvSource) -> AuthResult<Self> {
        let config = OidcConfig::from_env(env)?;
        let port = env.optional(ENV_GRPC_PORT, DEFAULT_GRPC_PORT);
        Self::new(config, port)
    }

    pub fn new(config: OidcConfig, port: impl Into<String>) -> AuthResult<Self> {
        Ok(Self::with_verifier(TokenVerifier::new(config)?, port))
    }

    pub fn with_verifier(verifier: TokenVerifier, port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            verifier: Arc::new(verifier),
        }
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Verifies `raw_token` with this server's identity provider.
    pub async fn verify_token(&self, raw_token: &str) -> AuthResult<Claims> {
        self.verifier.verify(raw_token).await
    }

    /// Verifies the bearer token in `request`'s metadata.
    pub async fn authorize<T>(&self, request: &Request<T>) -> AuthResult<Claims> {
        let token = request_token(request)?;
        self.verify_token(token).await
    }
}
