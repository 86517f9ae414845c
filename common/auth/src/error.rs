use ms_config::ConfigError;
use thiserror::Error;
use tonic::Status;

pub type AuthResult<T> = Result<T, AuthError>;

/// Coarse classification callers branch on.
///
/// `Configuration` means the deployment is broken; `TokenInvalid` and
/// `ClaimDecoding` mean this caller is not authenticated; `Forbidden` means
/// the caller is authenticated but lacks a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    TokenInvalid,
    ClaimDecoding,
    Forbidden,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
    #[error("OIDC discovery failed for '{issuer}': {reason}")]
    Discovery { issuer: String, reason: String },
    #[error("issuer did not match the issuer returned by provider, expected '{expected}' got '{found}'")]
    IssuerMismatch { expected: String, found: String },
    #[error("failed to fetch JWKS: {0}")]
    JwksFetch(String),
    #[error("failed to parse JWKS response: {0}")]
    JwksDecode(String),
    #[error("JWKS at '{0}' contains no usable signing keys")]
    JwksEmpty(String),
    #[error("failed to parse decoding key for kid '{0}': {1}")]
    KeyParse(String, String),
    #[error("failed to decode token header: {0}")]
    InvalidHeader(String),
    #[error("token missing kid header")]
    MissingKeyId,
    #[error("no decoding key registered for kid '{0}'")]
    UnknownKeyId(String),
    #[error("token signed with unsupported alg '{0}'")]
    UnsupportedAlgorithm(String),
    #[error("token verification failed: {0}")]
    Verification(String),
    #[error("malformed claim payload: {0}")]
    InvalidJson(String),
    #[error("authorization metadata missing")]
    MissingAuthorization,
    #[error("authorization metadata malformed")]
    InvalidAuthorization,
    #[error("insufficient role, required one of: {}", .required.join(", "))]
    Forbidden { required: Vec<String> },
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Config(_)
            | AuthError::HttpClient(_)
            | AuthError::Discovery { .. }
            | AuthError::IssuerMismatch { .. }
            | AuthError::JwksFetch(_)
            | AuthError::JwksDecode(_)
            | AuthError::JwksEmpty(_)
            | AuthError::KeyParse(_, _) => ErrorKind::Configuration,
            AuthError::InvalidHeader(_)
            | AuthError::MissingKeyId
            | AuthError::UnknownKeyId(_)
            | AuthError::UnsupportedAlgorithm(_)
            | AuthError::Verification(_)
            | AuthError::MissingAuthorization
            | AuthError::InvalidAuthorization => ErrorKind::TokenInvalid,
            AuthError::InvalidJson(_) => ErrorKind::ClaimDecoding,
            AuthError::Forbidden { .. } => ErrorKind::Forbidden,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        Self::Verification(value.to_string())
    }
}

impl From<AuthError> for Status {
    fn from(value: AuthError) -> Self {
        match value.kind() {
            ErrorKind::Configuration => Status::internal(value.to_string()),
            ErrorKind::TokenInvalid | ErrorKind::ClaimDecoding => {
                Status::unauthenticated(value.to_string())
            }
            ErrorKind::Forbidden => Status::permission_denied(value.to_string()),
        }
    }
}
