use super::allocation::{AllocationRecord, Product};
use super::catalog::{
    AllocationFilters, AllocationProductEntry, Credentials, GroupTerminal, LocationEntry,
    SupplierEntry,
};
use super::reference::{GroupKind, GroupMembers};
use crate::error::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::time::Duration;

/// Remote fuel-allocation catalog.
///
/// Implementations perform one upstream call per method; retries and caching
/// are layered on top by wrappers, never by the engine.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn fetch_allocations(
        &self,
        filters: &AllocationFilters,
        credentials: &Credentials,
    ) -> Result<Vec<AllocationRecord>>;

    async fn fetch_terminal_group(
        &self,
        seller_number: &str,
        group_id: i64,
        credentials: &Credentials,
    ) -> Result<Vec<GroupTerminal>>;

    /// `kind` must be a product kind; `GroupKind::Terminal` is an invalid
    /// request.
    async fn fetch_product_group(
        &self,
        seller_number: &str,
        group_id: i64,
        kind: GroupKind,
        credentials: &Credentials,
    ) -> Result<Vec<Product>>;

    async fn fetch_suppliers(&self, credentials: &Credentials) -> Result<Vec<SupplierEntry>>;

    async fn fetch_locations(
        &self,
        seller_number: &str,
        credentials: &Credentials,
    ) -> Result<Vec<LocationEntry>>;

    async fn fetch_allocation_products(
        &self,
        seller_number: &str,
        location_id: i64,
        credentials: &Credentials,
    ) -> Result<Vec<AllocationProductEntry>>;
}

/// Deferred upstream fetch handed to the cache on a miss.
pub type FetchFuture<'a> = BoxFuture<'a, Result<GroupMembers>>;

/// Time-bounded cache for group membership.
///
/// Concurrent calls for the same key must share a single execution of `fetch`.
/// Failed fetches are not cached.
#[async_trait]
pub trait GroupCache: Send + Sync {
    async fn get_or_fetch<'a>(
        &self,
        key: String,
        ttl: Duration,
        fetch: FetchFuture<'a>,
    ) -> Result<GroupMembers>;
}

pub type CatalogClientBox = Box<dyn CatalogClient>;
pub type GroupCacheBox = Box<dyn GroupCache>;
