use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{AuthError, AuthResult};

/// Separates a client id from a client-scoped role name.
pub const ROLES_SEPARATOR: char = '.';

/// Role-bearing subset of a token payload.
///
/// Flat `roles` and Keycloak's realm-wide `realm_access.roles` are stored
/// as-is; Keycloak's per-client `resource_access.<client>.roles` as
/// `<client>.<role>`. A missing or `null` source contributes nothing.
#[derive(Debug, Default, Deserialize)]
pub struct RoleClaims {
    // Claim defined in standards
    roles: Option<Vec<String>>,
    // Keycloak realm roles
    realm_access: Option<AccessClaims>,
    // Keycloak per-client roles
    resource_access: Option<HashMap<String, Option<AccessClaims>>>,
}

#[derive(Debug, Default, Deserialize)]
struct AccessClaims {
    roles: Option<Vec<String>>,
}

impl RoleClaims {
    /// Decodes the role-bearing claims of `raw`.
    ///
    /// Fails when a recognised key holds a value of the wrong shape, e.g. a
    /// string where an array of strings is expected.
    pub fn from_value(raw: &Value) -> AuthResult<Self> {
        RoleClaims::deserialize(raw).map_err(|err| AuthError::InvalidJson(err.to_string()))
    }

    /// Canonical role set: union of all three sources, duplicates collapsed.
    pub fn into_roles(self) -> HashSet<String> {
        let mut roles: HashSet<String> = self.roles.unwrap_or_default().into_iter().collect();

        if let Some(realm) = self.realm_access.and_then(|access| access.roles) {
            roles.extend(realm);
        }

        for (client, access) in self.resource_access.unwrap_or_default() {
            if let Some(client_roles) = access.and_then(|access| access.roles) {
                roles.extend(
                    client_roles
                        .iter()
                        .map(|role| client_role(&client, role)),
                );
            }
        }

        roles
    }
}

/// Decodes and canonicalises the roles carried by a validated payload.
pub fn extract_roles(raw: &Value) -> AuthResult<HashSet<String>> {
    RoleClaims::from_value(raw).map(RoleClaims::into_roles)
}

/// Canonical name of `role` scoped to `client`.
pub fn client_role(client: &str, role: &str) -> String {
    format!("{client}{ROLES_SEPARATOR}{role}")
}

/// Splits a role query on the first separator only.
///
/// Returns `(Some(client), role)` for client-scoped queries; the role part may
/// itself contain separators. Undotted queries are realm-wide: `(None, role)`.
pub fn split_role(query: &str) -> (Option<&str>, &str) {
    match query.split_once(ROLES_SEPARATOR) {
        Some((client, role)) => (Some(client), role),
        None => (None, query),
    }
}
