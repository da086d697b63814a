pub mod collection;
pub mod registry;

pub use collection::Collection;
pub use registry::{RegistryError, ResourceRegistry};
