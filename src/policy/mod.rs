pub mod registry;
pub mod schema;
pub mod validation;

pub use registry::{Registry, RegistryError, ResolvedPolicy};
pub use schema::*;
pub use validation::{validate_catalog, validate_institution};
