//! Domain model of supplier discovery: suppliers, certifications and the
//! immutable search criteria.

pub mod certification;
pub mod filters;
pub mod supplier;
pub mod types;
