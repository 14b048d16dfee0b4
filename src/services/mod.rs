pub mod cache;
pub mod certifications;
pub mod discovery;
pub mod errors;
pub mod saved;

pub use errors::{ServiceError, ServiceResult};
