//! REST transport for the marketplace backend.

use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::certification::SupplierCertification;
use crate::domain::filters::SearchFilters;
use crate::domain::supplier::{Supplier, SupplierProfile};
use crate::domain::types::SupplierId;
use crate::models::config::DiscoveryConfig;
use crate::pagination::PaginatedResult;
use crate::query;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{CertificationReader, SupplierReader, SupplierWriter};

/// `{ "data": ... }` wrapper used by single-resource endpoints.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// HTTP implementation of the repository traits.
#[derive(Debug, Clone)]
pub struct HttpSupplierRepository {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpSupplierRepository {
    pub fn new(config: &DiscoveryConfig) -> RepositoryResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| RepositoryError::Unexpected(format!("failed to build client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Attaches a bearer token to every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn suppliers_url(&self, filters: &SearchFilters) -> String {
        format!("{}?{}", self.url("suppliers"), query::to_query_string(filters))
    }

    fn saved_url(&self, supplier_id: SupplierId) -> String {
        self.url(&format!("suppliers/{supplier_id}/save"))
    }

    async fn send(&self, method: Method, url: &str) -> RepositoryResult<Response> {
        let mut request = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(RepositoryError::from_status(status, body))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> RepositoryResult<T> {
        let response = self.send(Method::GET, url).await?;
        response.json().await.map_err(Into::into)
    }
}

#[async_trait]
impl SupplierReader for HttpSupplierRepository {
    async fn search_suppliers(
        &self,
        filters: &SearchFilters,
    ) -> RepositoryResult<PaginatedResult<Supplier>> {
        let url = self.suppliers_url(filters);
        log::debug!("GET {url}");
        let page: PaginatedResult<Supplier> = self.get_json(&url).await?;
        Ok(PaginatedResult::new(page.data, page.meta))
    }
}

#[async_trait]
impl SupplierWriter for HttpSupplierRepository {
    async fn save_supplier(&self, supplier_id: SupplierId) -> RepositoryResult<()> {
        self.send(Method::POST, &self.saved_url(supplier_id)).await?;
        Ok(())
    }

    async fn unsave_supplier(&self, supplier_id: SupplierId) -> RepositoryResult<()> {
        self.send(Method::DELETE, &self.saved_url(supplier_id)).await?;
        Ok(())
    }
}

#[async_trait]
impl CertificationReader for HttpSupplierRepository {
    async fn list_certifications(
        &self,
        supplier_id: SupplierId,
    ) -> RepositoryResult<Vec<SupplierCertification>> {
        let url = self.url(&format!("suppliers/{supplier_id}"));
        let profile: DataEnvelope<SupplierProfile> = self.get_json(&url).await?;
        Ok(profile.data.certifications)
    }
}
