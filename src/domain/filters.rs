//! Immutable search criteria for a supplier discovery session.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::types::{
    CertificationType, LocationName, SearchTerm, ServiceType, SortBy, TypeConstraintError,
};

/// Current search criteria. `None` always means "no constraint"; in
/// particular `is_verified: Some(false)` is a real constraint distinct from
/// `None`.
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash)]
pub struct SearchFilters {
    query: Option<SearchTerm>,
    service_type: Option<ServiceType>,
    certifications: Option<BTreeSet<CertificationType>>,
    location: Option<LocationName>,
    min_moq: Option<u32>,
    max_moq: Option<u32>,
    is_verified: Option<bool>,
    sort_by: SortBy,
    page: u32,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            query: None,
            service_type: None,
            certifications: None,
            location: None,
            min_moq: None,
            max_moq: None,
            is_verified: None,
            sort_by: SortBy::default(),
            page: 1,
        }
    }
}

/// A single field update. Variants carrying `None` clear the constraint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterChange {
    Query(Option<SearchTerm>),
    ServiceType(Option<ServiceType>),
    Certifications(Option<BTreeSet<CertificationType>>),
    Location(Option<LocationName>),
    MinMoq(Option<u32>),
    MaxMoq(Option<u32>),
    Verified(Option<bool>),
    SortBy(SortBy),
    Page(u32),
}

impl SearchFilters {
    /// Returns a copy with `change` applied.
    #[must_use]
    pub fn with(&self, change: FilterChange) -> Self {
        let mut next = self.clone();
        match change {
            FilterChange::Query(query) => next.query = query,
            FilterChange::ServiceType(service_type) => next.service_type = service_type,
            FilterChange::Certifications(certifications) => {
                next.certifications = certifications.filter(|set| !set.is_empty());
            }
            FilterChange::Location(location) => next.location = location,
            FilterChange::MinMoq(min_moq) => next.min_moq = min_moq,
            FilterChange::MaxMoq(max_moq) => next.max_moq = max_moq,
            FilterChange::Verified(is_verified) => next.is_verified = is_verified,
            FilterChange::SortBy(sort_by) => next.sort_by = sort_by,
            FilterChange::Page(page) => next.page = page.max(1),
        }
        next
    }

    /// Selects `service_type`, or clears it when it is already selected.
    #[must_use]
    pub fn toggle_service_type(&self, service_type: ServiceType) -> Self {
        let next = (self.service_type != Some(service_type)).then_some(service_type);
        self.with(FilterChange::ServiceType(next))
    }

    /// Adds `certification` to the set, or removes it when present.
    #[must_use]
    pub fn toggle_certification(&self, certification: CertificationType) -> Self {
        let mut set = self.certifications.clone().unwrap_or_default();
        if !set.remove(&certification) {
            set.insert(certification);
        }
        self.with(FilterChange::Certifications(Some(set)))
    }

    /// Turns the verified-only constraint on, or clears it when already on.
    #[must_use]
    pub fn toggle_verified_only(&self) -> Self {
        let next = (self.is_verified != Some(true)).then_some(true);
        self.with(FilterChange::Verified(next))
    }

    /// Checks cross-field constraints that the backend would reject.
    pub fn validate(&self) -> Result<(), TypeConstraintError> {
        match (self.min_moq, self.max_moq) {
            (Some(min), Some(max)) if min > max => {
                Err(TypeConstraintError::InvertedMoqRange { min, max })
            }
            _ => Ok(()),
        }
    }

    /// True when `other` differs from `self` in nothing but the page.
    pub fn differs_only_in_page(&self, other: &SearchFilters) -> bool {
        self.with(FilterChange::Page(other.page)) == *other
    }

    pub fn query(&self) -> Option<&SearchTerm> {
        self.query.as_ref()
    }

    pub fn service_type(&self) -> Option<ServiceType> {
        self.service_type
    }

    pub fn certifications(&self) -> Option<&BTreeSet<CertificationType>> {
        self.certifications.as_ref()
    }

    pub fn location(&self) -> Option<&LocationName> {
        self.location.as_ref()
    }

    pub fn min_moq(&self) -> Option<u32> {
        self.min_moq
    }

    pub fn max_moq(&self) -> Option<u32> {
        self.max_moq
    }

    pub fn is_verified(&self) -> Option<bool> {
        self.is_verified
    }

    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    pub fn page(&self) -> u32 {
        self.page
    }
}
