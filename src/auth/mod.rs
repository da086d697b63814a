use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::types::{Permission, Role};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingCredential,

    #[error("{0}")]
    MalformedCredential(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub role: Role,
    /// Explicit grant; when absent the role's defaults apply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<Permission>>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: impl Into<String>, role: Role, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: sub.into(),
            role,
            permissions: None,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn with_permissions(mut self, permissions: Vec<Permission>) -> Self {
        self.permissions = Some(permissions);
        self
    }
}

/// Authenticated identity attached to a request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    pub subject: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn can(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        let permissions = claims.permissions.unwrap_or_else(|| claims.role.permissions());
        Self {
            subject: claims.sub,
            role: claims.role,
            permissions,
        }
    }
}

/// Resolves bearer credentials to principals
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Principal, AuthError>;
}

/// HS256 JWT identity provider
pub struct JwtIdentityProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: u64,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str, expiry_hours: u64) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, AuthError> {
        Self::new(&security.jwt_secret, security.jwt_expiry_hours)
    }

    pub fn claims_for(&self, subject: impl Into<String>, role: Role) -> Claims {
        Claims::new(subject, role, self.expiry_hours)
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(Principal::from(token_data.claims))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingCredential)?;

    // Scheme names are case-insensitive
    let token = match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("Bearer") => token.trim(),
        _ => {
            return Err(AuthError::MalformedCredential(
                "Authorization header must use Bearer token format".to_string(),
            ))
        }
    };

    if token.is_empty() {
        return Err(AuthError::MalformedCredential("Empty bearer token".to_string()));
    }
    Ok(token)
}

/// Permission check for mutating operations
pub fn authorize(principal: &Principal, permission: Permission) -> Result<(), crate::error::ApiError> {
    if principal.can(permission) {
        return Ok(());
    }

    tracing::warn!(
        "Access denied: '{}' ({:?}) lacks '{}' permission",
        principal.subject,
        principal.role,
        permission
    );
    Err(crate::error::ApiError::forbidden(format!(
        "Access denied: '{}' permission required",
        permission
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_token_round_trips_to_principal() {
        let provider = JwtIdentityProvider::new("secret", 1).unwrap();
        let token = provider.issue(&provider.claims_for("alice", Role::Editor)).unwrap();

        let principal = provider.authenticate(&token).await.unwrap();
        assert_eq!(principal.subject, "alice");
        assert_eq!(principal.role, Role::Editor);
        assert!(principal.can(Permission::Update));
        assert!(!principal.can(Permission::Delete));
    }

    #[tokio::test]
    async fn explicit_permissions_replace_role_defaults() {
        let provider = JwtIdentityProvider::new("secret", 1).unwrap();
        let claims = provider
            .claims_for("bot", Role::Admin)
            .with_permissions(vec![Permission::Read]);
        let token = provider.issue(&claims).unwrap();

        let principal = provider.authenticate(&token).await.unwrap();
        assert_eq!(principal.permissions, vec![Permission::Read]);
    }

    #[tokio::test]
    async fn rejects_token_signed_with_other_secret() {
        let issuer = JwtIdentityProvider::new("one", 1).unwrap();
        let verifier = JwtIdentityProvider::new("two", 1).unwrap();
        let token = issuer.issue(&issuer.claims_for("alice", Role::User)).unwrap();

        assert!(matches!(verifier.authenticate(&token).await, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let provider = JwtIdentityProvider::new("secret", 1).unwrap();
        let mut claims = provider.claims_for("alice", Role::Admin);
        claims.exp = (Utc::now() - Duration::hours(2)).timestamp();
        let token = provider.issue(&claims).unwrap();

        assert!(matches!(provider.authenticate(&token).await, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(JwtIdentityProvider::new("", 1), Err(AuthError::InvalidSecret)));
    }

    #[test]
    fn parses_bearer_header() {
        assert_eq!(bearer_token(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(Some("bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(Some("BEARER abc.def")).unwrap(), "abc.def");
        assert!(matches!(bearer_token(Some("Bearerabc.def")), Err(AuthError::MalformedCredential(_))));
        assert!(matches!(bearer_token(None), Err(AuthError::MissingCredential)));
        assert!(matches!(bearer_token(Some("Basic dXNlcg==")), Err(AuthError::MalformedCredential(_))));
        assert!(matches!(bearer_token(Some("Bearer   ")), Err(AuthError::MalformedCredential(_))));
    }

    #[test]
    fn authorize_checks_grant() {
        let reader = Principal::from(Claims::new("r", Role::User, 1));
        assert!(authorize(&reader, Permission::Read).is_ok());

        let err = authorize(&reader, Permission::Create).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }
}
