use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde_json::{Map, Value};

use crate::database::fields_from_json;
use crate::error::ApiError;

/// JSON object request body with system fields rejected
pub struct RecordFields(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for RecordFields
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => ApiError::payload_too_large(rejection.body_text()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE => ApiError::unsupported_media_type(rejection.body_text()),
                _ => ApiError::invalid_json(rejection.body_text()),
            })?;

        Ok(RecordFields(fields_from_json(value)?))
    }
}
