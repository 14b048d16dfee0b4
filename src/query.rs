//! Canonical request parameters for the supplier search endpoint.

use crate::domain::filters::SearchFilters;

pub const QUERY: &str = "query";
pub const SERVICE_TYPE: &str = "service_type";
pub const CERTIFICATIONS: &str = "certifications[]";
pub const LOCATION: &str = "location";
pub const MIN_MOQ: &str = "min_moq";
pub const MAX_MOQ: &str = "max_moq";
pub const IS_VERIFIED: &str = "is_verified";
pub const SORT_BY: &str = "sort_by";
pub const PAGE: &str = "page";

/// Flattens `filters` into ordered `(key, value)` pairs.
///
/// Absent constraints produce no pair at all. Certifications become one
/// `certifications[]` pair per member. `sort_by` and `page` are always sent.
pub fn to_params(filters: &SearchFilters) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();

    if let Some(query) = filters.query() {
        params.push((QUERY, query.to_string()));
    }
    if let Some(service_type) = filters.service_type() {
        params.push((SERVICE_TYPE, service_type.to_string()));
    }
    if let Some(certifications) = filters.certifications() {
        params.extend(
            certifications
                .iter()
                .map(|certification| (CERTIFICATIONS, certification.to_string())),
        );
    }
    if let Some(location) = filters.location() {
        params.push((LOCATION, location.to_string()));
    }
    if let Some(min_moq) = filters.min_moq() {
        params.push((MIN_MOQ, min_moq.to_string()));
    }
    if let Some(max_moq) = filters.max_moq() {
        params.push((MAX_MOQ, max_moq.to_string()));
    }
    if let Some(is_verified) = filters.is_verified() {
        params.push((IS_VERIFIED, is_verified.to_string()));
    }
    params.push((SORT_BY, filters.sort_by().to_string()));
    params.push((PAGE, filters.page().to_string()));

    params
}

/// URL-encoded form of [`to_params`].
pub fn to_query_string(filters: &SearchFilters) -> String {
    // Serializing a flat list of string pairs cannot fail.
    serde_html_form::to_string(to_params(filters)).unwrap_or_default()
}

/// Number of constraints shown on the "active filters" badge.
pub fn active_count(filters: &SearchFilters) -> usize {
    [
        filters.query().is_some(),
        filters.service_type().is_some(),
        filters.location().is_some(),
        filters.min_moq().is_some(),
        filters.max_moq().is_some(),
        filters.is_verified() == Some(true),
    ]
    .into_iter()
    .filter(|set| *set)
    .count()
        + filters.certifications().map_or(0, |set| set.len())
}
