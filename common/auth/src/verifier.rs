use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use reqwest::Client;
use serde_json::Value;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, info_span, warn, Instrument, Span};

use crate::claims::Claims;
use crate::config::OidcConfig;
use crate::discovery::{self, ProviderMetadata};
use crate::error::{AuthError, AuthResult};
use crate::jwks::{is_rsa_signature, JwksFetcher, SigningKey};

/// Thread-safe store for signing keys loaded from the provider's JWKS.
#[derive(Clone, Default)]
pub struct InMemoryKeyStore {
    inner: Arc<RwLock<HashMap<String, SigningKey>>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_key(&self, kid: impl Into<String>, key: SigningKey) {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        guard.insert(kid.into(), key);
    }

    pub fn get(&self, kid: &str) -> Option<SigningKey> {
        let guard = self.inner.read().expect("rwlock poisoned");
        guard.get(kid).cloned()
    }

    pub fn contains(&self, kid: &str) -> bool {
        let guard = self.inner.read().expect("rwlock poisoned");
        guard.contains_key(kid)
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("rwlock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn replace_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, SigningKey)>,
    {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        guard.clear();
        guard.extend(entries);
    }
}

/// A discovered identity provider: its metadata plus the signing keys it publishes.
#[derive(Clone)]
pub struct OidcProvider {
    metadata: ProviderMetadata,
    store: InMemoryKeyStore,
    jwks: JwksFetcher,
    // Time of the last refresh triggered by an unknown kid.
    miss_refresh: Arc<Mutex<Option<Instant>>>,
}

impl OidcProvider {
    /// Runs discovery against `issuer` and loads its key set.
    pub async fn discover(client: Client, issuer: &str) -> AuthResult<Self> {
        let metadata = discovery::discover(&client, issuer).await?;
        let jwks = JwksFetcher::with_client(client, metadata.jwks_uri.clone());
        let provider = Self {
            metadata,
            store: InMemoryKeyStore::new(),
            jwks,
            miss_refresh: Arc::new(Mutex::new(None)),
        };
        provider.refresh_jwks().await?;
        Ok(provider)
    }

    pub fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    pub fn store(&self) -> &InMemoryKeyStore {
        &self.store
    }

    pub async fn refresh_jwks(&self) -> AuthResult<usize> {
        let keys = self.jwks.fetch().await?;
        let count = keys.len();
        self.store.replace_all(keys);
        debug!(jwks_uri = self.jwks.url(), count, "loaded signing keys");
        Ok(count)
    }

    /// Verifies signature, expiry, issuer and audience; returns the raw payload.
    ///
    /// An unknown `kid` may trigger a JWKS refresh to pick up rotated keys; see
    /// [`OidcConfig::jwks_refresh_interval`].
    pub async fn verify(&self, token: &str, config: &OidcConfig) -> AuthResult<Value> {
        let header =
            decode_header(token).map_err(|err| AuthError::InvalidHeader(err.to_string()))?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;
        let key = self.key_for(&kid, config.jwks_refresh_interval).await?;

        check_algorithm(header.alg, &key, &self.metadata)?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.leeway = config.leeway_seconds.into();

        let token_data = decode::<Value>(token, &key.key, &validation)?;
        Ok(token_data.claims)
    }

    /// Concurrent misses share one fetch, and misses within `min_interval` of the
    /// previous miss-triggered refresh do not fetch at all.
    async fn key_for(&self, kid: &str, min_interval: Duration) -> AuthResult<SigningKey> {
        if let Some(key) = self.store.get(kid) {
            return Ok(key);
        }

        let mut last_refresh = self.miss_refresh.lock().await;
        // A refresh finished while this caller waited for the lock.
        if let Some(key) = self.store.get(kid) {
            return Ok(key);
        }
        let unknown = || AuthError::UnknownKeyId(kid.to_string());
        if last_refresh.is_some_and(|at| at.elapsed() < min_interval) {
            debug!(kid, "unknown kid, JWKS refreshed recently");
            return Err(unknown());
        }

        *last_refresh = Some(Instant::now());
        debug!(kid, "unknown kid, refreshing JWKS");
        if let Err(err) = self.refresh_jwks().await {
            warn!(kid, error = %err, "JWKS refresh for unknown kid failed");
            return Err(unknown());
        }
        self.store.get(kid).ok_or_else(unknown)
    }
}

fn check_algorithm(alg: Algorithm, key: &SigningKey, metadata: &ProviderMetadata) -> AuthResult<()> {
    let name = format!("{alg:?}");
    let pinned_elsewhere = key.alg.is_some_and(|pinned| pinned != alg);
    if !is_rsa_signature(alg) || pinned_elsewhere || !metadata.supports_alg(&name) {
        return Err(AuthError::UnsupportedAlgorithm(name));
    }
    Ok(())
}

/// Verifies bearer tokens against one issuer, discovering the provider on first use.
///
/// Discovery runs at most once per successful initialization, no matter how
/// many callers race on the first token. A failed or cancelled discovery
/// leaves the verifier uninitialized so a later call can try again.
pub struct TokenVerifier {
    config: OidcConfig,
    client: Client,
    provider: OnceCell<OidcProvider>,
    span: Span,
}

impl TokenVerifier {
    pub fn new(config: OidcConfig) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|err| AuthError::HttpClient(err.to_string()))?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: OidcConfig, client: Client) -> Self {
        let span = info_span!("token_verifier", issuer = %config.issuer, audience = %config.audience);
        Self {
            config,
            client,
            provider: OnceCell::new(),
            span,
        }
    }

    pub fn config(&self) -> &OidcConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.provider.initialized()
    }

    /// The discovered provider, running discovery if no caller has yet.
    pub async fn provider(&self) -> AuthResult<&OidcProvider> {
        self.provider
            .get_or_try_init(|| async {
                let provider = OidcProvider::discover(self.client.clone(), &self.config.issuer).await?;
                info!(jwks_uri = provider.jwks.url(), "OIDC provider initialised");
                Ok::<_, AuthError>(provider)
            })
            .instrument(self.span.clone())
            .await
    }

    /// Verifies `raw_token` and derives its canonical role set.
    pub async fn verify(&self, raw_token: &str) -> AuthResult<Claims> {
        let provider = self.provider().await?;
        let raw = provider
            .verify(raw_token, &self.config)
            .instrument(self.span.clone())
            .await?;

        let claims = Claims::try_from(raw).map_err(|err| {
            warn!(parent: &self.span, error = %err, "validated token carries malformed claims");
            err
        })?;
        debug!(parent: &self.span, subject = ?claims.subject(), roles = claims.len(), "verified token");
        Ok(claims)
    }
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
