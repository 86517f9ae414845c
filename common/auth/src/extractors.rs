use tonic::metadata::{Ascii, MetadataMap, MetadataValue};
use tonic::Request;

use crate::error::{AuthError, AuthResult};

/// Metadata key carrying the bearer token on incoming gRPC calls.
pub const AUTHORIZATION_KEY: &str = "authorization";

/// Bearer token carried by a request's `authorization` metadata.
pub fn bearer_token(metadata: &MetadataMap) -> AuthResult<&str> {
    let value = metadata
        .get(AUTHORIZATION_KEY)
        .ok_or(AuthError::MissingAuthorization)?;
    parse_bearer(value)
}

pub fn request_token<T>(request: &Request<T>) -> AuthResult<&str> {
    bearer_token(request.metadata())
}

fn parse_bearer(value: &MetadataValue<Ascii>) -> AuthResult<&str> {
    let raw = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization)?
        .trim();

    let token = raw
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthorization)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidAuthorization);
    }

    Ok(token)
}
