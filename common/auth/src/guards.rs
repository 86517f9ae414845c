use tracing::warn;

use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};
use crate::roles::client_role;

/// Passes when `claims` hold at least one of `allowed`; an empty list allows everyone.
///
/// Entries are canonical role names (`<client>.<role>` for client roles).
pub fn ensure_any_role(claims: &Claims, allowed: &[&str]) -> AuthResult<()> {
    if allowed.is_empty() || claims.has_any_role(allowed) {
        return Ok(());
    }

    warn!(subject = ?claims.subject(), ?allowed, "role check failed");
    Err(AuthError::Forbidden {
        required: allowed.iter().map(|value| value.to_string()).collect(),
    })
}

pub fn ensure_role(claims: &Claims, role: &str) -> AuthResult<()> {
    ensure_any_role(claims, &[role])
}

/// Like [`ensure_any_role`], with every role scoped to `client`.
pub fn ensure_client_role(claims: &Claims, client: &str, allowed: &[&str]) -> AuthResult<()> {
    let scoped: Vec<String> = allowed.iter().map(|role| client_role(client, role)).collect();
    let scoped: Vec<&str> = scoped.iter().map(String::as_str).collect();
    ensure_any_role(claims, &scoped)
}
