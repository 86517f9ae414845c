use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AuthError, AuthResult};

const WELL_KNOWN_PATH: &str = "/.well-known/openid-configuration";

/// Subset of `/.well-known/openid-configuration` needed for token verification.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub jwks_uri: String,
    #[serde(default)]
    pub id_token_signing_alg_values_supported: Vec<String>,
}

impl ProviderMetadata {
    /// Whether the provider advertises `alg`; an empty list advertises nothing and allows all.
    pub fn supports_alg(&self, alg: &str) -> bool {
        self.id_token_signing_alg_values_supported.is_empty()
            || self
                .id_token_signing_alg_values_supported
                .iter()
                .any(|value| value == alg)
    }
}

pub fn well_known_url(issuer: &str) -> String {
    format!("{}{WELL_KNOWN_PATH}", issuer.trim_end_matches('/'))
}

/// Fetches provider metadata and checks that it describes `issuer`.
pub async fn discover(client: &Client, issuer: &str) -> AuthResult<ProviderMetadata> {
    let url = well_known_url(issuer);
    let discovery_error = |reason: String| AuthError::Discovery {
        issuer: issuer.to_string(),
        reason,
    };

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|err| discovery_error(err.to_string()))?;

    if !response.status().is_success() {
        return Err(discovery_error(format!(
            "HTTP {} from {url}",
            response.status()
        )));
    }

    let metadata: ProviderMetadata = response
        .json()
        .await
        .map_err(|err| discovery_error(err.to_string()))?;

    if metadata.issuer != issuer {
        return Err(AuthError::IssuerMismatch {
            expected: issuer.to_string(),
            found: metadata.issuer,
        });
    }

    if metadata.jwks_uri.trim().is_empty() {
        return Err(discovery_error("jwks_uri is empty".to_string()));
    }

    debug!(issuer, jwks_uri = %metadata.jwks_uri, "discovered OIDC provider");
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn well_known_url_ignores_trailing_slash() {
        assert_eq!(
            well_known_url("https://idp.example/realms/main/"),
            "https://idp.example/realms/main/.well-known/openid-configuration"
        );
        assert_eq!(
            well_known_url("https://idp.example/realms/main"),
            "https://idp.example/realms/main/.well-known/openid-configuration"
        );
    }

    #[test]
    fn empty_alg_list_allows_everything() {
        let metadata = ProviderMetadata {
            issuer: "https://idp".into(),
            jwks_uri: "https://idp/certs".into(),
            id_token_signing_alg_values_supported: Vec::new(),
        };
        assert!(metadata.supports_alg("RS256"));

        let metadata = ProviderMetadata {
            id_token_signing_alg_values_supported: vec!["RS256".into()],
            ..metadata
        };
        assert!(metadata.supports_alg("RS256"));
        assert!(!metadata.supports_alg("PS512"));
    }

    #[tokio::test]
    async fn discover_reads_metadata() {
        let server = MockServer::start_async().await;
        let issuer = server.url("/realms/main");
        let body = json!({
            "issuer": issuer,
            "jwks_uri": server.url("/realms/main/certs"),
            "id_token_signing_alg_values_supported": ["RS256"]
        });
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/realms/main/.well-known/openid-configuration");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(body.to_string());
            })
            .await;

        let metadata = discover(&Client::new(), &issuer).await.expect("discovery");
        assert_eq!(metadata.issuer, issuer);
        assert_eq!(metadata.jwks_uri, server.url("/realms/main/certs"));
    }

    #[tokio::test]
    async fn discover_rejects_foreign_issuer() {
        let server = MockServer::start_async().await;
        let issuer = server.url("/realms/main");
        let body = json!({
            "issuer": "https://elsewhere.example/realms/main",
            "jwks_uri": server.url("/realms/main/certs")
        });
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/realms/main/.well-known/openid-configuration");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(body.to_string());
            })
            .await;

        let err = discover(&Client::new(), &issuer)
            .await
            .expect_err("issuer mismatch");
        assert!(matches!(err, AuthError::IssuerMismatch { .. }));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn discover_surfaces_http_failures() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/realms/main/.well-known/openid-configuration");
                then.status(503);
            })
            .await;

        let err = discover(&Client::new(), &server.url("/realms/main"))
            .await
            .expect_err("unavailable");
        assert!(matches!(err, AuthError::Discovery { .. }));
    }
}
