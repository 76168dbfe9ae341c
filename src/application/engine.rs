use super::cancel::CancelSignal;
use super::extractor::extract;
use super::fanout::fan_out;
use super::join::join;
use super::resolver::GroupResolver;
use crate::config::EngineConfig;
use crate::domain::allocation::{AllocationRecord, Product, Terminal};
use crate::domain::catalog::{
    AllocationFilters, AllocationProductEntry, Credentials, LocationEntry, SupplierEntry,
};
use crate::domain::ports::{CatalogClientBox, GroupCacheBox};
use crate::domain::reference::GroupKind;
use crate::error::{ResolutionFailed, Result};
use tracing::{debug, info};

/// Allocation records after enrichment, with the references that could not be
/// resolved.
///
/// Records whose groups failed are still present; their views fall back to the
/// direct reference or to empty.
#[derive(Debug, Default)]
pub struct Enrichment {
    pub records: Vec<AllocationRecord>,
    pub failures: Vec<ResolutionFailed>,
}

impl Enrichment {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The main entry point for allocation queries.
///
/// `AllocationEngine` fetches allocation records and expands the group
/// references they carry into concrete terminals and products. It owns the
/// catalog client and the group cache; both are injected so callers choose the
/// backends.
pub struct AllocationEngine {
    resolver: GroupResolver,
    config: EngineConfig,
}

impl AllocationEngine {
    /// Creates a new `AllocationEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `client` - Upstream catalog used for records and group lookups.
    /// * `cache` - TTL cache shared by every group lookup.
    /// * `config` - Concurrency, TTL and the enrichment switch.
    pub fn new(client: CatalogClientBox, cache: GroupCacheBox, config: EngineConfig) -> Self {
        Self {
            resolver: GroupResolver::new(client, cache, config.group_ttl),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetches allocation records matching `filters` and enriches them.
    ///
    /// Fails only when the allocation query itself fails. Group lookup
    /// failures are reported on the returned [`Enrichment`].
    pub async fn allocations(
        &self,
        filters: &AllocationFilters,
        credentials: &Credentials,
    ) -> Result<Enrichment> {
        let records = self
            .resolver
            .client()
            .fetch_allocations(filters, credentials)
            .await?;
        debug!(records = records.len(), "fetched allocation records");
        Ok(self.enrich(records, credentials).await)
    }

    /// Enriches an already fetched batch.
    pub async fn enrich(
        &self,
        records: Vec<AllocationRecord>,
        credentials: &Credentials,
    ) -> Enrichment {
        self.enrich_with_cancel(records, credentials, &CancelSignal::never())
            .await
    }

    /// Like [`enrich`](Self::enrich), but stops issuing lookups once `cancel`
    /// fires. References still pending at that point are reported as
    /// cancelled and their records keep the empty view.
    pub async fn enrich_with_cancel(
        &self,
        mut records: Vec<AllocationRecord>,
        credentials: &Credentials,
        cancel: &CancelSignal,
    ) -> Enrichment {
        if !self.config.pull_reference_data_groups {
            debug!(records = records.len(), "group enrichment disabled");
            return Enrichment {
                records,
                failures: Vec::new(),
            };
        }

        let extracted = extract(&records);
        let references: Vec<_> = extracted.references().cloned().collect();
        let resolved = fan_out(
            references,
            self.config.concurrency,
            cancel,
            move |reference| async move { self.resolver.resolve(&reference, credentials).await },
        )
        .await;

        join(&mut records, &extracted, &resolved);

        let mut failures: Vec<ResolutionFailed> =
            resolved.into_values().filter_map(|g| g.failure).collect();
        failures.sort_by(|a, b| a.reference.cmp(&b.reference));

        info!(
            records = records.len(),
            references = extracted.len(),
            failures = failures.len(),
            "allocation enrichment complete"
        );
        Enrichment { records, failures }
    }

    pub async fn suppliers(&self, credentials: &Credentials) -> Result<Vec<SupplierEntry>> {
        self.resolver.client().fetch_suppliers(credentials).await
    }

    pub async fn locations(
        &self,
        seller_number: &str,
        credentials: &Credentials,
    ) -> Result<Vec<LocationEntry>> {
        self.resolver
            .client()
            .fetch_locations(seller_number, credentials)
            .await
    }

    pub async fn allocation_products(
        &self,
        seller_number: &str,
        location_id: i64,
        credentials: &Credentials,
    ) -> Result<Vec<AllocationProductEntry>> {
        self.resolver
            .client()
            .fetch_allocation_products(seller_number, location_id, credentials)
            .await
    }

    /// Members of a terminal group, served from the cache when fresh.
    pub async fn grouped_terminals(
        &self,
        seller_number: &str,
        group_id: i64,
        credentials: &Credentials,
    ) -> Result<Vec<Terminal>> {
        self.resolver
            .grouped_terminals(seller_number, group_id, credentials)
            .await
    }

    /// Members of a product family or product group, served from the cache
    /// when fresh.
    pub async fn grouped_products(
        &self,
        seller_number: &str,
        group_id: i64,
        kind: GroupKind,
        credentials: &Credentials,
    ) -> Result<Vec<Product>> {
        self.resolver
            .grouped_products(seller_number, group_id, kind, credentials)
            .await
    }
}
