use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Path},
    http::request::Parts,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ApiError;
use crate::resource::{Collection, ResourceRegistry};

/// Collection accessor for the `:resource` path segment.
///
/// Resolution happens while extracting, so an unknown resource type rejects
/// the request before any handler code runs.
pub struct Resource(pub Arc<Collection>);

/// The `:id` path segment, passed through to the accessor unparsed
pub struct RecordId(pub String);

async fn path_params<S: Send + Sync>(parts: &mut Parts, state: &S) -> Result<HashMap<String, String>, ApiError> {
    let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?;
    Ok(params)
}

#[async_trait]
impl<S> FromRequestParts<S> for Resource
where
    S: Send + Sync,
    Arc<ResourceRegistry>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = path_params(parts, state).await?;
        let name = params
            .get("resource")
            .ok_or_else(|| ApiError::internal_server_error("Route is missing the :resource parameter"))?;

        let registry = Arc::<ResourceRegistry>::from_ref(state);
        let collection = registry.resolve(name).await.map_err(|e| {
            tracing::debug!("Resource resolution failed for '{}': {}", name, e);
            ApiError::from(e)
        })?;

        Ok(Resource(collection))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let mut params = path_params(parts, state).await?;
        params
            .remove("id")
            .map(RecordId)
            .ok_or_else(|| ApiError::internal_server_error("Route is missing the :id parameter"))
    }
}
