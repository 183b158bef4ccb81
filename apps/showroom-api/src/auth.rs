//! JWT authentication module.
//!
//! Tokens are issued elsewhere (the showroom's login service); this module
//! only verifies them and turns the claims into a [`CurrentCustomer`].
//!
//! ## Request Flow
//! ```text
//! Authorization: Bearer <jwt>
//!        │
//!        ▼
//! CurrentCustomer::from_request_parts ── missing / bad token ──► 401
//!        │
//!        ▼
//! AdminUser::from_request_parts ──────── is_admin == false ────► 403
//! ```

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::SharedState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (customer id)
    pub sub: String,

    /// Staff flag; customers omit it
    #[serde(default)]
    pub is_admin: bool,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentCustomer {
    pub id: String,
    pub is_admin: bool,
}

impl CurrentCustomer {
    /// Fails with 403 unless the caller is staff.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// HS256 token verifier.
#[derive(Clone)]
pub struct Authenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator").finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Create an authenticator for the given shared secret.
    pub fn new(secret: &str) -> Self {
        Authenticator {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Validates a bearer token and returns the caller it names.
    pub fn current_customer(&self, token: &str) -> Result<CurrentCustomer, ApiError> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {}", e)))?;

        if data.claims.sub.trim().is_empty() {
            return Err(ApiError::Unauthorized("Token has no subject".to_string()));
        }

        Ok(CurrentCustomer {
            id: data.claims.sub,
            is_admin: data.claims.is_admin,
        })
    }

    /// Signs a token for `customer_id`. Used by tooling and tests.
    pub fn issue(
        &self,
        customer_id: &str,
        is_admin: bool,
        lifetime_secs: i64,
    ) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            sub: customer_id.to_string(),
            is_admin,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(lifetime_secs)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<SharedState> for CurrentCustomer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

        state.auth.current_customer(token)
    }
}

/// A caller that passed the admin check.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentCustomer);

impl FromRequestParts<SharedState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let caller = CurrentCustomer::from_request_parts(parts, state).await?;
        caller.require_admin()?;
        Ok(AdminUser(caller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        let auth = Authenticator::new("test-secret");
        let token = auth.issue("cliente-001", false, 3600).unwrap();

        let caller = auth.current_customer(&token).unwrap();
        assert_eq!(caller.id, "cliente-001");
        assert!(!caller.is_admin);
        assert!(matches!(caller.require_admin(), Err(ApiError::Forbidden)));
    }

    #[test]
    fn test_wrong_secret_and_expired() {
        let issuer = Authenticator::new("issuer-secret");
        let token = issuer.issue("admin-1", true, 3600).unwrap();
        assert!(Authenticator::new("other-secret").current_customer(&token).is_err());

        let expired = issuer.issue("admin-1", true, -3600).unwrap();
        assert!(matches!(
            issuer.current_customer(&expired),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
