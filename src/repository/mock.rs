//! Mock repository implementations for isolating services in tests.

use async_trait::async_trait;
use mockall::mock;

use crate::domain::certification::SupplierCertification;
use crate::domain::filters::SearchFilters;
use crate::domain::supplier::Supplier;
use crate::domain::types::SupplierId;
use crate::pagination::PaginatedResult;
use crate::repository::errors::RepositoryResult;
use crate::repository::{CertificationReader, SupplierReader, SupplierWriter};

mock! {
    pub Repository {}

    #[async_trait]
    impl SupplierReader for Repository {
        async fn search_suppliers(
            &self,
            filters: &SearchFilters,
        ) -> RepositoryResult<PaginatedResult<Supplier>>;
    }

    #[async_trait]
    impl SupplierWriter for Repository {
        async fn save_supplier(&self, supplier_id: SupplierId) -> RepositoryResult<()>;
        async fn unsave_supplier(&self, supplier_id: SupplierId) -> RepositoryResult<()>;
    }

    #[async_trait]
    impl CertificationReader for Repository {
        async fn list_certifications(
            &self,
            supplier_id: SupplierId,
        ) -> RepositoryResult<Vec<SupplierCertification>>;
    }
}
