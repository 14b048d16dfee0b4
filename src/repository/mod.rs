//! Data-source seams consumed by the discovery services.
//!
//! The backend is opaque: [`http::HttpSupplierRepository`] talks to the REST
//! API, [`memory::InMemorySupplierRepository`] serves fixtures in-process.

use async_trait::async_trait;

use crate::domain::certification::SupplierCertification;
use crate::domain::filters::SearchFilters;
use crate::domain::supplier::Supplier;
use crate::domain::types::SupplierId;
use crate::pagination::PaginatedResult;
use crate::repository::errors::RepositoryResult;

pub mod errors;
pub mod http;
pub mod memory;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;

#[async_trait]
pub trait SupplierReader: Send + Sync {
    async fn search_suppliers(
        &self,
        filters: &SearchFilters,
    ) -> RepositoryResult<PaginatedResult<Supplier>>;
}

#[async_trait]
pub trait SupplierWriter: Send + Sync {
    async fn save_supplier(&self, supplier_id: SupplierId) -> RepositoryResult<()>;
    async fn unsave_supplier(&self, supplier_id: SupplierId) -> RepositoryResult<()>;
}

#[async_trait]
pub trait CertificationReader: Send + Sync {
    async fn list_certifications(
        &self,
        supplier_id: SupplierId,
    ) -> RepositoryResult<Vec<SupplierCertification>>;
}
