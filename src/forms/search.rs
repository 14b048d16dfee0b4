use std::collections::BTreeSet;

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::domain::filters::{FilterChange, SearchFilters};
use crate::domain::types::{
    CertificationType, LocationName, SearchTerm, ServiceType, SortBy,
};
use crate::forms::FormError;

#[derive(Debug, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_moq_range"))]
/// Raw supplier search parameters as they appear in a query string.
pub struct SearchForm {
    /// Free-text search.
    pub query: Option<String>,
    pub service_type: Option<ServiceType>,
    /// Repeated `certifications[]` parameters.
    #[serde(rename = "certifications[]", default)]
    pub certifications: Vec<CertificationType>,
    pub location: Option<String>,
    pub min_moq: Option<u32>,
    pub max_moq: Option<u32>,
    pub is_verified: Option<bool>,
    pub sort_by: Option<SortBy>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
}

fn validate_moq_range(form: &SearchForm) -> Result<(), ValidationError> {
    match (form.min_moq, form.max_moq) {
        (Some(min), Some(max)) if min > max => Err(ValidationError::new("moq_range")
            .with_message("minimum order quantity exceeds maximum".into())),
        _ => Ok(()),
    }
}

impl SearchForm {
    /// Deserializes a raw query string such as `service_type=cmt&page=2`.
    pub fn from_query(raw: &str) -> Result<Self, FormError> {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        serde_html_form::from_str(raw).map_err(|err| FormError::Malformed(err.to_string()))
    }

    /// Parses and validates a query string into search criteria.
    pub fn parse(raw: &str) -> Result<SearchFilters, FormError> {
        SearchFilters::try_from(Self::from_query(raw)?)
    }
}

impl TryFrom<SearchForm> for SearchFilters {
    type Error = FormError;

    fn try_from(form: SearchForm) -> Result<Self, Self::Error> {
        form.validate()?;

        let certifications: BTreeSet<CertificationType> = form.certifications.into_iter().collect();

        let filters = SearchFilters::default()
            .with(FilterChange::Query(
                form.query.and_then(SearchTerm::parse_optional),
            ))
            .with(FilterChange::ServiceType(form.service_type))
            .with(FilterChange::Certifications(Some(certifications)))
            .with(FilterChange::Location(
                form.location.and_then(LocationName::parse_optional),
            ))
            .with(FilterChange::MinMoq(form.min_moq))
            .with(FilterChange::MaxMoq(form.max_moq))
            .with(FilterChange::Verified(form.is_verified))
            .with(FilterChange::SortBy(form.sort_by.unwrap_or_default()))
            .with(FilterChange::Page(form.page.unwrap_or(1)));

        Ok(filters)
    }
}
