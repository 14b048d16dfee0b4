//! Supplier discovery and engagement engine for the designer/manufacturer
//! marketplace.
//!
//! The `data` feature exposes the pure layer: the domain model, search
//! criteria, query composition, pagination planning and certification
//! evaluation. The default `client` feature adds the async repository
//! transport, the discovery controller and the saved-state synchronizer.

pub mod domain;
pub mod forms;
pub mod pagination;
pub mod query;

#[cfg(feature = "client")]
pub mod dto;
#[cfg(feature = "client")]
pub mod models;
#[cfg(feature = "client")]
pub mod repository;
#[cfg(feature = "client")]
pub mod services;
