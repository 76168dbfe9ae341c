use crate::config::RetryPolicy;
use crate::domain::allocation::{AllocationRecord, Product};
use crate::domain::catalog::{
    AllocationFilters, AllocationProductEntry, Credentials, GroupTerminal, LocationEntry,
    SupplierEntry,
};
use crate::domain::ports::CatalogClient;
use crate::domain::reference::GroupKind;
use crate::error::Result;
use async_trait::async_trait;
use std::future::Future;
use tracing::warn;

/// Retries transient failures of the wrapped client with exponential backoff.
///
/// Sits below the engine: callers see either the eventual success or the last
/// error, never the intermediate attempts.
pub struct RetryingCatalogClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: CatalogClient> RetryingCatalogClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    async fn with_retry<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    let delay = self.policy.delay_for(attempt);
                    warn!(operation, attempt, ?delay, error = %e, "transient catalog failure, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl<C: CatalogClient> CatalogClient for RetryingCatalogClient<C> {
    async fn fetch_allocations(
        &self,
        filters: &AllocationFilters,
        credentials: &Credentials,
    ) -> Result<Vec<AllocationRecord>> {
        self.with_retry("allocations", || {
            self.inner.fetch_allocations(filters, credentials)
        })
        .await
    }

    async fn fetch_terminal_group(
        &self,
        seller_number: &str,
        group_id: i64,
        credentials: &Credentials,
    ) -> Result<Vec<GroupTerminal>> {
        self.with_retry("terminal_group", || {
            self.inner
                .fetch_terminal_group(seller_number, group_id, credentials)
        })
        .await
    }

    async fn fetch_product_group(
        &self,
        seller_number: &str,
        group_id: i64,
        kind: GroupKind,
        credentials: &Credentials,
    ) -> Result<Vec<Product>> {
        self.with_retry("product_group", || {
            self.inner
                .fetch_product_group(seller_number, group_id, kind, credentials)
        })
        .await
    }

    async fn fetch_suppliers(&self, credentials: &Credentials) -> Result<Vec<SupplierEntry>> {
        self.with_retry("suppliers", || self.inner.fetch_suppliers(credentials))
            .await
    }

    async fn fetch_locations(
        &self,
        seller_number: &str,
        credentials: &Credentials,
    ) -> Result<Vec<LocationEntry>> {
        self.with_retry("locations", || {
            self.inner.fetch_locations(seller_number, credentials)
        })
        .await
    }

    async fn fetch_allocation_products(
        &self,
        seller_number: &str,
        location_id: i64,
        credentials: &Credentials,
    ) -> Result<Vec<AllocationProductEntry>> {
        self.with_retry("allocation_products", || {
            self.inner
                .fetch_allocation_products(seller_number, location_id, credentials)
        })
        .await
    }
}
