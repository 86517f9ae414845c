use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AuthError, AuthResult};
use crate::roles::{client_role, split_role, RoleClaims};

/// Verified identity and the canonical role set derived from a token.
///
/// Realm-wide and flat roles are stored by name; client roles as
/// `<client>.<role>`. The set is private: [`Claims::roles`] hands out a copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Claims {
    roles: HashSet<String>,
    subject: Option<String>,
    preferred_username: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl Claims {
    /// Claims carrying only `roles`, already in canonical form.
    pub fn from_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Exact membership test against the canonical set.
    ///
    /// Client-scoped roles are queried as `<client>.<role>`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn has_client_role(&self, client: &str, role: &str) -> bool {
        self.has_role(&client_role(client, role))
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }

    /// Role names held under `client`, read back through the first-dot rule.
    ///
    /// A dotted realm role such as `ops.admin` is indistinguishable from the
    /// `admin` role of client `ops` and is reported here as well.
    pub fn client_roles(&self, client: &str) -> HashSet<String> {
        self.roles
            .iter()
            .filter_map(|entry| match split_role(entry) {
                (Some(owner), role) if owner == client => Some(role.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Copy of every role; changes to it never reach these claims.
    pub fn roles(&self) -> HashSet<String> {
        self.roles.clone()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn preferred_username(&self) -> Option<&str> {
        self.preferred_username.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    sub: Option<String>,
    preferred_username: Option<String>,
    exp: Option<f64>,
    #[serde(flatten)]
    roles: RoleClaims,
}

impl TryFrom<ClaimsRepr> for Claims {
    type Error = AuthError;

    fn try_from(value: ClaimsRepr) -> AuthResult<Self> {
        let expires_at = match value.exp {
            Some(exp) => Some(
                Utc.timestamp_opt(exp as i64, 0)
                    .single()
                    .ok_or_else(|| AuthError::InvalidJson(format!("exp out of range: {exp}")))?,
            ),
            None => None,
        };

        Ok(Self {
            roles: value.roles.into_roles(),
            subject: value.sub,
            preferred_username: value.preferred_username,
            expires_at,
        })
    }
}

impl TryFrom<Value> for Claims {
    type Error = AuthError;

    fn try_from(value: Value) -> AuthResult<Self> {
        let repr: ClaimsRepr = serde_json::from_value(value)
            .map_err(|err| AuthError::InvalidJson(err.to_string()))?;
        Claims::try_from(repr)
    }
}
