pub mod auth;
pub mod body;
pub mod resource;
pub mod response;

pub use body::RecordFields;
pub use resource::{RecordId, Resource};
pub use response::{ApiResponse, ApiResult};
