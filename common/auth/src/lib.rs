pub mod claims;
pub mod config;
pub mod discovery;
pub mod error;
pub mod extractors;
pub mod guards;
pub mod jwks;
pub mod roles;
pub mod service;
pub mod verifier;

pub use claims::Claims;
pub use config::{OidcConfig, DEFAULT_AUDIENCE, ENV_AUTH_AUDIENCE, ENV_AUTH_ISSUER};
pub use discovery::ProviderMetadata;
pub use error::{AuthError, AuthResult, ErrorKind};
pub use extractors::{bearer_token, request_token};
pub use guards::{ensure_any_role, ensure_client_role, ensure_role};
pub use jwks::{JwksFetcher, SigningKey};
pub use roles::{client_role, extract_roles, split_role, RoleClaims, ROLES_SEPARATOR};
pub use service::{BaseServiceServer, DEFAULT_GRPC_PORT, ENV_GRPC_PORT};
pub use verifier::{InMemoryKeyStore, OidcProvider, TokenVerifier};
