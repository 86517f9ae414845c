#![allow(dead_code)]

use std::sync::OnceLock;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use httpmock::prelude::*;
use httpmock::Mock;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ms_auth::{OidcConfig, TokenVerifier};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{json, Value};

pub const REALM_PATH: &str = "/realms/test";
pub const KID: &str = "test-key";
pub const AUDIENCE: &str = "account";

pub struct KeyMaterial {
    pub encoding: EncodingKey,
    pub modulus: String,
    pub exponent: String,
}

/// One RSA key per test binary; generation is slow in debug builds.
pub fn key_material() -> &'static KeyMaterial {
    static MATERIAL: OnceLock<KeyMaterial> = OnceLock::new();
    MATERIAL.get_or_init(|| {
        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
        let public_key = private_key.to_public_key();
        let private_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("private pem");

        KeyMaterial {
            encoding: EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("encoding key"),
            modulus: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            exponent: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        }
    })
}

pub fn issuer_url(server: &MockServer) -> String {
    server.url(REALM_PATH)
}

pub fn config(server: &MockServer) -> OidcConfig {
    OidcConfig::new(issuer_url(server), AUDIENCE)
}

pub fn verifier(server: &MockServer) -> TokenVerifier {
    TokenVerifier::new(config(server)).expect("http client")
}

pub async fn mock_discovery(server: &MockServer, delay: Option<Duration>) -> Mock<'_> {
    let body = json!({
        "issuer": issuer_url(server),
        "jwks_uri": server.url(format!("{REALM_PATH}/protocol/openid-connect/certs")),
        "id_token_signing_alg_values_supported": ["RS256"]
    });
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("{REALM_PATH}/.well-known/openid-configuration"));
            let then = then
                .status(200)
                .header("content-type", "application/json")
                .body(body.to_string());
            if let Some(delay) = delay {
                then.delay(delay);
            }
        })
        .await
}

pub async fn mock_jwks(server: &MockServer) -> Mock<'_> {
    let material = key_material();
    let body = json!({
        "keys": [
            {
                "kid": KID,
                "kty": "RSA",
                "alg": "RS256",
                "use": "sig",
                "n": material.modulus,
                "e": material.exponent
            },
            {
                "kid": "encryption-key",
                "kty": "RSA",
                "alg": "RSA-OAEP",
                "use": "enc",
                "n": material.modulus,
                "e": material.exponent
            }
        ]
    });
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("{REALM_PATH}/protocol/openid-connect/certs"));
            then.status(200)
                .header("content-type", "application/json")
                .body(body.to_string());
        })
        .await
}

/// Standard claims for `server`'s issuer, valid for ten minutes.
pub fn base_claims(server: &MockServer) -> Value {
    let issued_at = Utc::now().timestamp();
    json!({
        "sub": "0f5c3a8e-1d7b-4c0e-9a51-2b9d7d3f6a10",
        "preferred_username": "alice",
        "iss": issuer_url(server),
        "aud": AUDIENCE,
        "iat": issued_at,
        "exp": issued_at + 600
    })
}

/// `base_claims` with `extra` merged over it.
pub fn claims_with(server: &MockServer, extra: Value) -> Value {
    let mut claims = base_claims(server);
    if let (Some(target), Some(source)) = (claims.as_object_mut(), extra.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
    claims
}

pub fn sign(claims: &Value, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    encode(&header, claims, &key_material().encoding).expect("sign token")
}
