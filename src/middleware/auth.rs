use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use crate::auth::{bearer_token, AuthError, IdentityProvider, Principal};
use crate::error::ApiError;

/// Bearer authentication: a handler taking a `Principal` only runs for a
/// request whose credential the identity provider accepts.
#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    Arc<dyn IdentityProvider>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .map(|value| value.to_str())
            .transpose()
            .map_err(|_| AuthError::MalformedCredential("Invalid Authorization header format".to_string()))?;

        let token = bearer_token(header)?;

        let identity = Arc::<dyn IdentityProvider>::from_ref(state);
        let principal = identity.authenticate(token).await.map_err(|e| {
            tracing::warn!("Authentication failed for {} {}: {}", parts.method, parts.uri.path(), e);
            e
        })?;

        tracing::debug!("Authenticated '{}' as {:?}", principal.subject, principal.role);
        Ok(principal)
    }
}
