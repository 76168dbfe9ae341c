use crate::domain::allocation::{Product, Terminal};
use crate::domain::catalog::Credentials;
use crate::domain::ports::{CatalogClient, CatalogClientBox, FetchFuture, GroupCacheBox};
use crate::domain::reference::{GroupKind, GroupMembers, GroupReference};
use crate::error::{CatalogError, Result};
use std::time::Duration;
use tracing::debug;

/// Expands a [`GroupReference`] into its members through the TTL cache.
pub struct GroupResolver {
    client: CatalogClientBox,
    cache: GroupCacheBox,
    ttl: Duration,
}

impl GroupResolver {
    pub fn new(client: CatalogClientBox, cache: GroupCacheBox, ttl: Duration) -> Self {
        Self { client, cache, ttl }
    }

    pub fn client(&self) -> &dyn CatalogClient {
        self.client.as_ref()
    }

    /// Cached lookup keyed by [`GroupReference::cache_key`]. Concurrent calls
    /// for the same reference share one upstream request.
    pub async fn resolve(
        &self,
        reference: &GroupReference,
        credentials: &Credentials,
    ) -> Result<GroupMembers> {
        let fetch: FetchFuture<'_> = Box::pin(self.fetch_upstream(reference, credentials));
        self.cache
            .get_or_fetch(reference.cache_key(), self.ttl, fetch)
            .await
    }

    pub async fn grouped_terminals(
        &self,
        seller_number: &str,
        group_id: i64,
        credentials: &Credentials,
    ) -> Result<Vec<Terminal>> {
        let reference = GroupReference::new(GroupKind::Terminal, seller_number, group_id);
        match self.resolve(&reference, credentials).await? {
            GroupMembers::Terminals(terminals) => Ok(terminals),
            GroupMembers::Products(_) => Err(CatalogError::InvalidRequest(format!(
                "cache entry for {reference} holds products"
            ))),
        }
    }

    pub async fn grouped_products(
        &self,
        seller_number: &str,
        group_id: i64,
        kind: GroupKind,
        credentials: &Credentials,
    ) -> Result<Vec<Product>> {
        if kind == GroupKind::Terminal {
            return Err(CatalogError::InvalidRequest(
                "terminal groups do not contain products".to_string(),
            ));
        }
        let reference = GroupReference::new(kind, seller_number, group_id);
        match self.resolve(&reference, credentials).await? {
            GroupMembers::Products(products) => Ok(products),
            GroupMembers::Terminals(_) => Err(CatalogError::InvalidRequest(format!(
                "cache entry for {reference} holds terminals"
            ))),
        }
    }

    async fn fetch_upstream(
        &self,
        reference: &GroupReference,
        credentials: &Credentials,
    ) -> Result<GroupMembers> {
        debug!(
            kind = ?reference.kind,
            seller_number = %reference.seller_number,
            group_id = reference.group_id,
            "fetching group members"
        );
        match reference.kind {
            GroupKind::Terminal => {
                let terminals = self
                    .client
                    .fetch_terminal_group(&reference.seller_number, reference.group_id, credentials)
                    .await?;
                Ok(GroupMembers::Terminals(
                    terminals.into_iter().map(Terminal::from).collect(),
                ))
            }
            GroupKind::ProductFamily | GroupKind::ProductGroup => {
                let products = self
                    .client
                    .fetch_product_group(
                        &reference.seller_number,
                        reference.group_id,
                        reference.kind,
                        credentials,
                    )
                    .await?;
                Ok(GroupMembers::Products(products))
            }
        }
    }
}
