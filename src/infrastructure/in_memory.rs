use crate::domain::allocation::{AllocationRecord, Product};
use crate::domain::catalog::{
    AllocationFilters, AllocationProductEntry, Credentials, GroupTerminal, LocationEntry,
    SupplierEntry,
};
use crate::domain::ports::CatalogClient;
use crate::domain::reference::{GroupKind, GroupReference};
use crate::error::{CatalogError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Default)]
struct CatalogState {
    allocations: Vec<AllocationRecord>,
    terminal_groups: HashMap<(String, i64), Vec<GroupTerminal>>,
    product_groups: HashMap<(String, i64, GroupKind), Vec<Product>>,
    suppliers: Vec<SupplierEntry>,
    locations: HashMap<String, Vec<LocationEntry>>,
    allocation_products: HashMap<(String, i64), Vec<AllocationProductEntry>>,
    failing: HashSet<GroupReference>,
    latency: Duration,
}

/// A thread-safe in-memory catalog.
///
/// Serves canned data through the same port as the HTTP client and counts
/// every group lookup.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<CatalogState>>,
    group_calls: Arc<AtomicUsize>,
    allocation_calls: Arc<AtomicUsize>,
}

impl InMemoryCatalog {
    /// Creates a new, empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_allocations(&self, records: impl IntoIterator<Item = AllocationRecord>) {
        self.state.write().await.allocations.extend(records);
    }

    pub async fn insert_terminal_group(
        &self,
        seller_number: &str,
        group_id: i64,
        terminals: Vec<GroupTerminal>,
    ) {
        self.state
            .write()
            .await
            .terminal_groups
            .insert((seller_number.to_string(), group_id), terminals);
    }

    pub async fn insert_product_group(
        &self,
        seller_number: &str,
        group_id: i64,
        kind: GroupKind,
        products: Vec<Product>,
    ) {
        self.state
            .write()
            .await
            .product_groups
            .insert((seller_number.to_string(), group_id, kind), products);
    }

    pub async fn insert_supplier(&self, supplier: SupplierEntry) {
        self.state.write().await.suppliers.push(supplier);
    }

    pub async fn insert_location(&self, seller_number: &str, location: LocationEntry) {
        self.state
            .write()
            .await
            .locations
            .entry(seller_number.to_string())
            .or_default()
            .push(location);
    }

    pub async fn insert_allocation_product(
        &self,
        seller_number: &str,
        location_id: i64,
        product: AllocationProductEntry,
    ) {
        self.state
            .write()
            .await
            .allocation_products
            .entry((seller_number.to_string(), location_id))
            .or_default()
            .push(product);
    }

    /// Makes every lookup of `reference` fail with an HTTP 500.
    pub async fn fail_group(&self, reference: GroupReference) {
        self.state.write().await.failing.insert(reference);
    }

    /// Delay applied to every group lookup.
    pub async fn set_latency(&self, latency: Duration) {
        self.state.write().await.latency = latency;
    }

    /// Number of group lookups served, failed ones included.
    pub fn group_calls(&self) -> usize {
        self.group_calls.load(Ordering::SeqCst)
    }

    pub fn allocation_calls(&self) -> usize {
        self.allocation_calls.load(Ordering::SeqCst)
    }

    async fn lookup_delay(&self, reference: &GroupReference) -> Result<()> {
        self.group_calls.fetch_add(1, Ordering::SeqCst);
        let (latency, failing) = {
            let state = self.state.read().await;
            (state.latency, state.failing.contains(reference))
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if failing {
            return Err(CatalogError::Status {
                status: 500,
                url: memory_url(reference),
            });
        }
        Ok(())
    }
}

fn memory_url(reference: &GroupReference) -> String {
    format!("memory://{}", reference.cache_key())
}

fn not_found(reference: &GroupReference) -> CatalogError {
    CatalogError::Status {
        status: 404,
        url: memory_url(reference),
    }
}

/// Keeps records whose seller matches `at_seller_num`, when that filter is set.
fn matches_filters(record: &AllocationRecord, filters: &AllocationFilters) -> bool {
    filters.at_seller_num.is_empty() || filters.at_seller_num.contains(&record.supplier.seller_num)
}

#[async_trait]
impl CatalogClient for InMemoryCatalog {
    async fn fetch_allocations(
        &self,
        filters: &AllocationFilters,
        _credentials: &Credentials,
    ) -> Result<Vec<AllocationRecord>> {
        self.allocation_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.read().await;
        Ok(state
            .allocations
            .iter()
            .filter(|r| matches_filters(r, filters))
            .cloned()
            .collect())
    }

    async fn fetch_terminal_group(
        &self,
        seller_number: &str,
        group_id: i64,
        _credentials: &Credentials,
    ) -> Result<Vec<GroupTerminal>> {
        let reference = GroupReference::new(GroupKind::Terminal, seller_number, group_id);
        self.lookup_delay(&reference).await?;
        let state = self.state.read().await;
        state
            .terminal_groups
            .get(&(seller_number.to_string(), group_id))
            .cloned()
            .ok_or_else(|| not_found(&reference))
    }

    async fn fetch_product_group(
        &self,
        seller_number: &str,
        group_id: i64,
        kind: GroupKind,
        _credentials: &Credentials,
    ) -> Result<Vec<Product>> {
        if kind == GroupKind::Terminal {
            return Err(CatalogError::InvalidRequest(
                "terminal groups do not contain products".to_string(),
            ));
        }
        let reference = GroupReference::new(kind, seller_number, group_id);
        self.lookup_delay(&reference).await?;
        let state = self.state.read().await;
        state
            .product_groups
            .get(&(seller_number.to_string(), group_id, kind))
            .cloned()
            .ok_or_else(|| not_found(&reference))
    }

    async fn fetch_suppliers(&self, _credentials: &Credentials) -> Result<Vec<SupplierEntry>> {
        Ok(self.state.read().await.suppliers.clone())
    }

    async fn fetch_locations(
        &self,
        seller_number: &str,
        _credentials: &Credentials,
    ) -> Result<Vec<LocationEntry>> {
        let state = self.state.read().await;
        Ok(state
            .locations
            .get(seller_number)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_allocation_products(
        &self,
        seller_number: &str,
        location_id: i64,
        _credentials: &Credentials,
    ) -> Result<Vec<AllocationProductEntry>> {
        let state = self.state.read().await;
        Ok(state
            .allocation_products
            .get(&(seller_number.to_string(), location_id))
            .cloned()
            .unwrap_or_default())
    }
}
