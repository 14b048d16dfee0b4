//! DTOs that bridge services with the presentation layer.

pub mod certification;
pub mod search;
