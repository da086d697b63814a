pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use record::{fields_from_json, Record, RecordError};
pub use store::{parse_id, DocumentStore, StoreError};
