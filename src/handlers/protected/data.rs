use tracing::info;

use crate::auth::{authorize, Principal};
use crate::database::Record;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RecordFields, RecordId, Resource};
use crate::types::Permission;

// Bodies are taken as `Result` so the permission check runs before a bad
// body can be reported.

/// GET /api/v2/:resource - List all records
pub async fn list(Resource(collection): Resource, _principal: Principal) -> ApiResult<Vec<Record>> {
    let records = collection.list().await?;
    Ok(ApiResponse::success(records))
}

/// GET /api/v2/:resource/:id - Get a single record by ID
pub async fn get(
    Resource(collection): Resource,
    _principal: Principal,
    RecordId(id): RecordId,
) -> ApiResult<Record> {
    let record = collection.get_by_id(&id).await?;
    Ok(ApiResponse::success(record))
}

/// POST /api/v2/:resource - Create a record (requires `create`)
pub async fn create(
    Resource(collection): Resource,
    principal: Principal,
    body: Result<RecordFields, ApiError>,
) -> ApiResult<Record> {
    authorize(&principal, Permission::Create)?;
    let RecordFields(fields) = body?;

    let record = collection.create(fields).await?;
    info!("{} created {} record {}", principal.subject, collection.name(), record.id);
    Ok(ApiResponse::created(record))
}

/// PUT /api/v2/:resource/:id - Merge fields into a record (requires `update`)
pub async fn update(
    Resource(collection): Resource,
    principal: Principal,
    RecordId(id): RecordId,
    body: Result<RecordFields, ApiError>,
) -> ApiResult<Record> {
    authorize(&principal, Permission::Update)?;
    let RecordFields(fields) = body?;

    let record = collection.update(&id, fields).await?;
    info!("{} updated {} record {}", principal.subject, collection.name(), record.id);
    Ok(ApiResponse::success(record))
}

/// DELETE /api/v2/:resource/:id - Delete a record (requires `delete`)
pub async fn delete(
    Resource(collection): Resource,
    principal: Principal,
    RecordId(id): RecordId,
) -> ApiResult<Record> {
    authorize(&principal, Permission::Delete)?;

    let record = collection.delete(&id).await?;
    info!("{} deleted {} record {}", principal.subject, collection.name(), record.id);
    Ok(ApiResponse::success(record))
}
