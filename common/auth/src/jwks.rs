use std::fmt;
use std::str::FromStr;

use jsonwebtoken::{Algorithm, DecodingKey};
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::error::{AuthError, AuthResult};

const RSA_KEY_TYPE: &str = "RSA";
const SIGNATURE_USE: &str = "sig";

/// Public key published by the provider, with the algorithm it is pinned to (if any).
#[derive(Clone)]
pub struct SigningKey {
    pub key: DecodingKey,
    pub alg: Option<Algorithm>,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey").field("alg", &self.alg).finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct JwksFetcher {
    client: Client,
    url: String,
}

impl JwksFetcher {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches the key set, keeping RSA signing keys only.
    ///
    /// Keycloak publishes encryption keys next to signing keys; those are skipped.
    pub async fn fetch(&self) -> AuthResult<Vec<(String, SigningKey)>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| AuthError::JwksFetch(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetch(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        let body: JwksResponse = response
            .json()
            .await
            .map_err(|err| AuthError::JwksDecode(err.to_string()))?;

        let mut keys = Vec::new();
        for entry in body.keys {
            if let Some(key) = signing_key(entry)? {
                keys.push(key);
            }
        }

        if keys.is_empty() {
            return Err(AuthError::JwksEmpty(self.url.clone()));
        }
        Ok(keys)
    }
}

fn signing_key(entry: JwkEntry) -> AuthResult<Option<(String, SigningKey)>> {
    let Some(kid) = entry.kid else {
        warn!("skipping JWKS entry without kid");
        return Ok(None);
    };

    let kty = entry.kty.as_deref().unwrap_or(RSA_KEY_TYPE);
    if kty != RSA_KEY_TYPE {
        warn!(kid, kty, "skipping non-RSA JWKS entry");
        return Ok(None);
    }

    if entry.key_use.as_deref().is_some_and(|usage| usage != SIGNATURE_USE) {
        warn!(kid, "skipping JWKS entry not meant for signatures");
        return Ok(None);
    }

    let alg = match entry.alg.as_deref() {
        Some(name) => match Algorithm::from_str(name) {
            Ok(alg) if is_rsa_signature(alg) => Some(alg),
            _ => {
                warn!(kid, alg = name, "skipping JWKS entry with unsupported alg");
                return Ok(None);
            }
        },
        None => None,
    };

    let (Some(modulus), Some(exponent)) = (entry.n, entry.e) else {
        return Err(AuthError::KeyParse(
            kid,
            "missing RSA modulus or exponent".to_string(),
        ));
    };

    let key = DecodingKey::from_rsa_components(&modulus, &exponent)
        .map_err(|err| AuthError::KeyParse(kid.clone(), err.to_string()))?;
    Ok(Some((kid, SigningKey { key, alg })))
}

/// RSA signature algorithms accepted for ID tokens.
pub fn is_rsa_signature(alg: Algorithm) -> bool {
    matches!(
        alg,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<JwkEntry>,
}

#[derive(Debug, Deserialize)]
struct JwkEntry {
    kid: Option<String>,
    kty: Option<String>,
    alg: Option<String>,
    #[serde(rename = "use")]
    key_use: Option<String>,
    n: Option<String>,
    e: Option<String>,
}
