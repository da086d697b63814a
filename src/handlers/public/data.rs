use tracing::debug;

use crate::database::Record;
use crate::middleware::{ApiResponse, ApiResult, RecordFields, RecordId, Resource};

/// GET /api/v1/:resource - List all records
pub async fn list(Resource(collection): Resource) -> ApiResult<Vec<Record>> {
    let records = collection.list().await?;
    debug!("Listed {} {} record(s)", records.len(), collection.name());
    Ok(ApiResponse::success(records))
}

/// GET /api/v1/:resource/:id - Get a single record by ID
pub async fn get(Resource(collection): Resource, RecordId(id): RecordId) -> ApiResult<Record> {
    let record = collection.get_by_id(&id).await?;
    Ok(ApiResponse::success(record))
}

/// POST /api/v1/:resource - Create a record
pub async fn create(Resource(collection): Resource, RecordFields(fields): RecordFields) -> ApiResult<Record> {
    let record = collection.create(fields).await?;
    debug!("Created {} record {}", collection.name(), record.id);
    Ok(ApiResponse::created(record))
}

/// PUT /api/v1/:resource/:id - Merge fields into a record
pub async fn update(
    Resource(collection): Resource,
    RecordId(id): RecordId,
    RecordFields(fields): RecordFields,
) -> ApiResult<Record> {
    let record = collection.update(&id, fields).await?;
    debug!("Updated {} record {}", collection.name(), record.id);
    Ok(ApiResponse::success(record))
}

/// DELETE /api/v1/:resource/:id - Delete a record, returning it
pub async fn delete(Resource(collection): Resource, RecordId(id): RecordId) -> ApiResult<Record> {
    let record = collection.delete(&id).await?;
    debug!("Deleted {} record {}", collection.name(), record.id);
    Ok(ApiResponse::success(record))
}
