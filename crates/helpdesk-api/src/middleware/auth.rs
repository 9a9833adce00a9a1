//! Authentication
//!
//! Bearer tokens are HS256 JWTs. The `Identity` extractor turns a valid
//! token into a `Caller`; handlers that take it reject anonymous requests.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use helpdesk_core::{Caller, EntityId, PolicyError, Role, User};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::ApiState;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub exp: usize,
}

/// Signing and verification keys plus token lifetime
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            // Out-of-range lifetimes make `issue` fail instead of panicking here
            ttl: Duration::try_hours(ttl_hours).unwrap_or(Duration::MAX),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, ApiError> {
        let expiration = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ApiError::internal("token expiry out of range"))?
            .timestamp() as usize;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.to_string(),
            name: user.name.clone(),
            role: user.role.as_str().into(),
            exp: expiration,
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(ApiError::internal)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(token_data.claims)
    }

    /// Resolve a token into a caller. A well-signed token naming a role this
    /// service does not know is forbidden rather than unauthenticated.
    pub fn resolve(&self, token: &str) -> Result<Caller, PolicyError> {
        let claims = self.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            PolicyError::Unauthenticated
        })?;
        let role: Role = claims
            .role
            .parse()
            .map_err(|_| PolicyError::Forbidden(format!("unrecognized role {}", claims.role)))?;
        Ok(Caller::new(EntityId::from_string(claims.sub), role))
    }
}

/// Authenticated caller of the current request
#[derive(Debug, Clone)]
pub struct Identity(pub Caller);

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<ApiState>) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(ApiError::unauthenticated)?;

        Ok(Identity(state.tokens.resolve(token)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::Email;

    fn user(role: Role) -> User {
        User::new("Alex Agent".into(), Email::parse("alex@example.com").unwrap(), role, "hash".into(), Utc::now())
    }

    #[test]
    fn test_token_round_trip() {
        let keys = TokenKeys::new(b"test-secret", 8);
        let agent = user(Role::Agent);
        let token = keys.issue(&agent).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, agent.id.to_string());
        assert_eq!(claims.role, "agent");
        assert_eq!(keys.resolve(&token).unwrap(), Caller::Agent { id: agent.id });
    }

    #[test]
    fn test_foreign_secret_is_unauthenticated() {
        let token = TokenKeys::new(b"other-secret", 8).issue(&user(Role::Client)).unwrap();
        let keys = TokenKeys::new(b"test-secret", 8);
        assert_eq!(keys.resolve(&token), Err(PolicyError::Unauthenticated));
        assert_eq!(keys.resolve("garbage"), Err(PolicyError::Unauthenticated));
    }

    #[test]
    fn test_expired_token_is_unauthenticated() {
        let keys = TokenKeys::new(b"test-secret", -2);
        let token = keys.issue(&user(Role::Client)).unwrap();
        assert_eq!(keys.resolve(&token), Err(PolicyError::Unauthenticated));
    }

    #[test]
    fn test_huge_ttl_fails_to_issue() {
        let keys = TokenKeys::new(b"test-secret", i64::MAX);
        assert!(keys.issue(&user(Role::Client)).is_err());
    }

    #[test]
    fn test_unknown_role_is_forbidden() {
        let keys = TokenKeys::new(b"test-secret", 8);
        let claims = Claims {
            sub: "u1".into(),
            email: "root@example.com".into(),
            name: "Root".into(),
            role: "admin".into(),
            exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret")).unwrap();
        assert!(matches!(keys.resolve(&token), Err(PolicyError::Forbidden(_))));
    }
}
