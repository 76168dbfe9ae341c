use crate::config::HttpConfig;
use crate::domain::allocation::{AllocationRecord, Product};
use crate::domain::catalog::{
    AllocationFilters, AllocationProductEntry, Credentials, Envelope, GroupTerminal,
    LocationEntry, SupplierEntry,
};
use crate::domain::ports::CatalogClient;
use crate::domain::reference::GroupKind;
use crate::error::{CatalogError, Result};
use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tracing::debug;

const ROOT: &str = "allocation-tracker";

/// Catalog client speaking the fuel-suite JSON API over HTTPS.
///
/// Credentials travel as the `webservicekey`, `apikey` and `username` headers
/// on every request. Any non-2xx answer becomes [`CatalogError::Status`].
#[derive(Clone)]
pub struct HttpCatalogClient {
    http: reqwest::Client,
    base_url: Url,
    config: HttpConfig,
}

impl HttpCatalogClient {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            CatalogError::InvalidRequest(format!("invalid base url {}: {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidRequest(format!(
                "base url {} cannot carry a path",
                config.base_url
            )));
        }
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                CatalogError::InvalidRequest(format!("base url {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .push(ROOT)
            .extend(segments);
        Ok(url)
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&'static str, String)],
        credentials: &Credentials,
    ) -> Result<Vec<T>> {
        debug!(url = %url, params = query.len(), "catalog request");
        let response = self
            .http
            .get(url.clone())
            .query(query)
            .header(ACCEPT, self.config.accept.as_str())
            .header("webservicekey", credentials.web_service_key.as_str())
            .header("apikey", credentials.apikey.as_str())
            .header("username", credentials.username.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        let envelope: Envelope<T> = serde_json::from_slice(&body)?;
        Ok(envelope.data)
    }
}

fn group_segment(kind: GroupKind) -> Result<&'static str> {
    match kind {
        GroupKind::ProductFamily => Ok("product-families"),
        GroupKind::ProductGroup => Ok("product-groups"),
        GroupKind::Terminal => Err(CatalogError::InvalidRequest(
            "terminal groups do not contain products".to_string(),
        )),
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn fetch_allocations(
        &self,
        filters: &AllocationFilters,
        credentials: &Credentials,
    ) -> Result<Vec<AllocationRecord>> {
        let url = self.endpoint(&["allocations"])?;
        self.get_data(url, &filters.query_pairs(), credentials).await
    }

    async fn fetch_terminal_group(
        &self,
        seller_number: &str,
        group_id: i64,
        credentials: &Credentials,
    ) -> Result<Vec<GroupTerminal>> {
        let id = group_id.to_string();
        let url = self.endpoint(&[
            "suppliers",
            seller_number,
            "terminal-groups",
            &id,
            "terminals",
        ])?;
        self.get_data(url, &[], credentials).await
    }

    async fn fetch_product_group(
        &self,
        seller_number: &str,
        group_id: i64,
        kind: GroupKind,
        credentials: &Credentials,
    ) -> Result<Vec<Product>> {
        let segment = group_segment(kind)?;
        let id = group_id.to_string();
        let url = self.endpoint(&["suppliers", seller_number, segment, &id, "products"])?;
        self.get_data(url, &[], credentials).await
    }

    async fn fetch_suppliers(&self, credentials: &Credentials) -> Result<Vec<SupplierEntry>> {
        let url = self.endpoint(&["suppliers"])?;
        self.get_data(url, &[], credentials).await
    }

    async fn fetch_locations(
        &self,
        seller_number: &str,
        credentials: &Credentials,
    ) -> Result<Vec<LocationEntry>> {
        let url = self.endpoint(&["suppliers", seller_number, "locations"])?;
        self.get_data(url, &[], credentials).await
    }

    async fn fetch_allocation_products(
        &self,
        seller_number: &str,
        location_id: i64,
        credentials: &Credentials,
    ) -> Result<Vec<AllocationProductEntry>> {
        let id = location_id.to_string();
        let url = self.endpoint(&["suppliers", seller_number, "locations", &id, "products"])?;
        self.get_data(url, &[], credentials).await
    }
}
