//! In-process data source that applies search semantics to fixture data.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::certification::SupplierCertification;
use crate::domain::filters::SearchFilters;
use crate::domain::supplier::Supplier;
use crate::domain::types::{SortBy, SupplierId};
use crate::pagination::{PageMeta, PaginatedResult};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{CertificationReader, SupplierReader, SupplierWriter};

#[derive(Debug, Default)]
struct Catalog {
    suppliers: Vec<Supplier>,
    certifications: HashMap<SupplierId, Vec<SupplierCertification>>,
    saved: HashSet<SupplierId>,
}

/// Fixture-backed repository. Suppliers keep their insertion order, which
/// doubles as "newest last" for [`SortBy::Newest`].
#[derive(Debug)]
pub struct InMemorySupplierRepository {
    per_page: u32,
    catalog: Mutex<Catalog>,
}

impl InMemorySupplierRepository {
    pub fn new(per_page: u32) -> Self {
        Self {
            per_page: per_page.max(1),
            catalog: Mutex::new(Catalog::default()),
        }
    }

    #[must_use]
    pub fn with_supplier(self, supplier: Supplier) -> Self {
        self.insert(supplier);
        self
    }

    #[must_use]
    pub fn with_certifications(
        self,
        supplier_id: SupplierId,
        certifications: Vec<SupplierCertification>,
    ) -> Self {
        self.lock().certifications.insert(supplier_id, certifications);
        self
    }

    pub fn insert(&self, supplier: Supplier) {
        let mut catalog = self.lock();
        if supplier.is_saved {
            catalog.saved.insert(supplier.id);
        }
        catalog.suppliers.retain(|existing| existing.id != supplier.id);
        catalog.suppliers.push(supplier);
    }

    /// Backend-side saved state, independent of any client store.
    pub fn is_saved(&self, supplier_id: SupplierId) -> bool {
        self.lock().saved.contains(&supplier_id)
    }

    fn lock(&self) -> MutexGuard<'_, Catalog> {
        self.catalog.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn exists(catalog: &Catalog, supplier_id: SupplierId) -> bool {
        catalog.suppliers.iter().any(|s| s.id == supplier_id)
    }
}

fn matches(supplier: &Supplier, filters: &SearchFilters) -> bool {
    if let Some(term) = filters.query() {
        let needle = term.to_lowercase();
        if !supplier.company_name.to_lowercase().contains(&needle) {
            return false;
        }
    }
    if filters
        .service_type()
        .is_some_and(|service_type| supplier.service_type != service_type)
    {
        return false;
    }
    if filters
        .certifications()
        .is_some_and(|wanted| !wanted.iter().all(|c| supplier.has_certification(*c)))
    {
        return false;
    }
    if let Some(location) = filters.location() {
        let needle = location.to_lowercase();
        let found = supplier
            .location
            .as_ref()
            .is_some_and(|l| l.to_lowercase().contains(&needle));
        if !found {
            return false;
        }
    }
    let moq = supplier.minimum_order_quantity;
    if filters.min_moq().is_some_and(|min| moq.is_none_or(|moq| moq < min)) {
        return false;
    }
    if filters.max_moq().is_some_and(|max| moq.is_none_or(|moq| moq > max)) {
        return false;
    }
    if filters
        .is_verified()
        .is_some_and(|verified| supplier.is_verified != verified)
    {
        return false;
    }
    true
}

fn sort(suppliers: &mut [Supplier], sort_by: SortBy) {
    match sort_by {
        SortBy::Relevance => suppliers.sort_by_key(|s| !s.is_featured),
        SortBy::Newest => suppliers.reverse(),
        SortBy::MoqAsc => suppliers.sort_by_key(|s| s.minimum_order_quantity.unwrap_or(u32::MAX)),
        SortBy::MoqDesc => {
            suppliers.sort_by_key(|s| std::cmp::Reverse(s.minimum_order_quantity.unwrap_or(0)))
        }
        SortBy::LeadTimeAsc => suppliers.sort_by_key(|s| s.lead_time_days.unwrap_or(u32::MAX)),
        SortBy::ResponseTimeAsc => {
            suppliers.sort_by_key(|s| s.response_time_hours.unwrap_or(u32::MAX))
        }
    }
}

#[async_trait]
impl SupplierReader for InMemorySupplierRepository {
    async fn search_suppliers(
        &self,
        filters: &SearchFilters,
    ) -> RepositoryResult<PaginatedResult<Supplier>> {
        let catalog = self.lock();

        let mut found: Vec<Supplier> = catalog
            .suppliers
            .iter()
            .filter(|supplier| matches(supplier, filters))
            .cloned()
            .map(|mut supplier| {
                supplier.is_saved = catalog.saved.contains(&supplier.id);
                supplier
            })
            .collect();
        sort(&mut found, filters.sort_by());

        let total = found.len() as u64;
        let per_page = self.per_page as usize;
        let offset = (filters.page() as usize - 1) * per_page;
        let data: Vec<Supplier> = found.into_iter().skip(offset).take(per_page).collect();
        let meta = PageMeta::for_page(filters.page(), self.per_page, total, data.len());

        Ok(PaginatedResult::new(data, meta))
    }
}

#[async_trait]
impl SupplierWriter for InMemorySupplierRepository {
    async fn save_supplier(&self, supplier_id: SupplierId) -> RepositoryResult<()> {
        let mut catalog = self.lock();
        if !Self::exists(&catalog, supplier_id) {
            return Err(RepositoryError::NotFound);
        }
        if !catalog.saved.insert(supplier_id) {
            return Err(RepositoryError::Conflict(format!(
                "supplier {supplier_id} is already saved"
            )));
        }
        Ok(())
    }

    async fn unsave_supplier(&self, supplier_id: SupplierId) -> RepositoryResult<()> {
        let mut catalog = self.lock();
        if !Self::exists(&catalog, supplier_id) {
            return Err(RepositoryError::NotFound);
        }
        if !catalog.saved.remove(&supplier_id) {
            return Err(RepositoryError::Conflict(format!(
                "supplier {supplier_id} is not saved"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CertificationReader for InMemorySupplierRepository {
    async fn list_certifications(
        &self,
        supplier_id: SupplierId,
    ) -> RepositoryResult<Vec<SupplierCertification>> {
        let catalog = self.lock();
        if !Self::exists(&catalog, supplier_id) {
            return Err(RepositoryError::NotFound);
        }
        Ok(catalog
            .certifications
            .get(&supplier_id)
            .cloned()
            .unwrap_or_default())
    }
}
