use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::join_all;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::models::{AssetMetadata, AssetType};
use crate::traits::chain_client::ChainQueryClient;
use crate::utils::asset_type::normalize_address;

#[derive(Debug, Clone)]
struct CacheEntry {
    metadata: Option<AssetMetadata>,
    fetched_at: Instant,
}

/// Combined result of one metadata query per asset type.
#[derive(Debug, Clone, Default)]
pub struct MetadataJoin {
    /// Aligned with the type list passed in; `None` for missing, failed or
    /// pending entries.
    pub data: Vec<Option<AssetMetadata>>,
    pub is_success: bool,
    pub is_pending: bool,
    pub is_error: bool,
    by_type: HashMap<AssetType, AssetMetadata>,
}

impl MetadataJoin {
    /// Metadata for a type, looked up by normalized identity.
    pub fn get(&self, asset_type: &AssetType) -> Option<&AssetMetadata> {
        self.by_type.get(&normalize_address(asset_type.as_str()))
    }
}

/// Fetches coin metadata per asset type and caches it by normalized type.
pub struct MetadataJoiner {
    client: Arc<dyn ChainQueryClient>,
    cache: Arc<DashMap<AssetType, CacheEntry>>,
    stale_after: Duration,
}

impl MetadataJoiner {
    pub fn new(client: Arc<dyn ChainQueryClient>, stale_after: Duration) -> Self {
        Self {
            client,
            cache: Arc::new(DashMap::new()),
            stale_after,
        }
    }

    fn fresh(&self, asset_type: &AssetType) -> Option<CacheEntry> {
        self.cache
            .get(asset_type)
            .filter(|entry| entry.fetched_at.elapsed() < self.stale_after)
            .map(|entry| entry.value().clone())
    }

    /// Query metadata for every type not fresh in the cache, then combine.
    ///
    /// An empty type list issues no queries. Individual failures leave a
    /// `None` in `data` and set `is_error`, never fail the join.
    pub async fn join(&self, types: &[AssetType]) -> MetadataJoin {
        let normalized: Vec<AssetType> = types
            .iter()
            .map(|t| normalize_address(t.as_str()))
            .collect();

        let mut seen = HashSet::new();
        let to_fetch: Vec<AssetType> = normalized
            .iter()
            .filter(|t| self.fresh(t).is_none() && seen.insert((*t).clone()))
            .cloned()
            .collect();

        let mut failed = HashSet::new();
        if !to_fetch.is_empty() {
            debug!("Fetching metadata for {} asset types", to_fetch.len());
            let queries = to_fetch.iter().map(|asset_type| async move {
                (asset_type, self.client.get_coin_metadata(asset_type).await)
            });

            for (asset_type, result) in join_all(queries).await {
                match result {
                    Ok(metadata) => {
                        if metadata.is_none() {
                            debug!("No coin metadata published for {}", asset_type);
                        }
                        self.cache.insert(
                            asset_type.clone(),
                            CacheEntry {
                                metadata,
                                fetched_at: Instant::now(),
                            },
                        );
                    }
                    Err(e) => {
                        warn!("Metadata fetch failed for {}: {}", asset_type, e);
                        failed.insert(asset_type.clone());
                    }
                }
            }
        }

        self.combine(&normalized, |t| {
            if failed.contains(t) {
                Lookup::Failed
            } else {
                self.cache
                    .get(t)
                    .map(|entry| Lookup::Done(entry.metadata.clone()))
                    .unwrap_or(Lookup::Pending)
            }
        })
    }

    /// Non-blocking view of what the cache already holds. Types without a
    /// fresh entry count as pending.
    pub fn cached(&self, types: &[AssetType]) -> MetadataJoin {
        let normalized: Vec<AssetType> = types
            .iter()
            .map(|t| normalize_address(t.as_str()))
            .collect();
        self.combine(&normalized, |t| match self.fresh(t) {
            Some(entry) => Lookup::Done(entry.metadata),
            None => Lookup::Pending,
        })
    }

    /// Drop every cached entry.
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    fn combine(&self, types: &[AssetType], lookup: impl Fn(&AssetType) -> Lookup) -> MetadataJoin {
        let mut join = MetadataJoin {
            is_success: true,
            ..MetadataJoin::default()
        };

        for asset_type in types {
            match lookup(asset_type) {
                Lookup::Done(metadata) => {
                    if let Some(metadata) = &metadata {
                        join.by_type.insert(asset_type.clone(), metadata.clone());
                    }
                    join.data.push(metadata);
                }
                Lookup::Failed => {
                    join.is_success = false;
                    join.is_error = true;
                    join.data.push(None);
                }
                Lookup::Pending => {
                    join.is_success = false;
                    join.is_pending = true;
                    join.data.push(None);
                }
            }
        }

        join
    }
}

enum Lookup {
    Done(Option<AssetMetadata>),
    Failed,
    Pending,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Address, AssetMembership, ObjectDescriptor, ObjectFilter, ObjectId, ObjectOptions,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MetadataOnly {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChainQueryClient for MetadataOnly {
        async fn get_owned_objects(
            &self,
            _owner: &Address,
            _filter: &ObjectFilter,
        ) -> anyhow::Result<Vec<ObjectDescriptor>> {
            Ok(vec![])
        }

        async fn multi_get_objects(
            &self,
            _ids: &[ObjectId],
            _options: ObjectOptions,
        ) -> anyhow::Result<Vec<Option<ObjectDescriptor>>> {
            Ok(vec![])
        }

        async fn get_dynamic_fields(&self, _parent: &ObjectId) -> anyhow::Result<Vec<AssetMembership>> {
            Ok(vec![])
        }

        async fn get_coin_metadata(&self, asset_type: &AssetType) -> anyhow::Result<Option<AssetMetadata>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match asset_type.as_str() {
                "0x2::sui::SUI" => Ok(Some(AssetMetadata::new(9, Some("SUI".into())))),
                "0xbad::broken::B" => Err(anyhow::anyhow!("node timeout")),
                _ => Ok(None),
            }
        }
    }

    fn joiner() -> (Arc<MetadataOnly>, MetadataJoiner) {
        let client = Arc::new(MetadataOnly {
            calls: AtomicUsize::new(0),
        });
        let joiner = MetadataJoiner::new(client.clone(), Duration::from_secs(30));
        (client, joiner)
    }

    #[tokio::test]
    async fn empty_type_list_issues_no_queries() {
        let (client, joiner) = joiner();
        let join = joiner.join(&[]).await;
        assert!(join.is_success);
        assert!(join.data.is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failures_degrade_without_failing_the_join() {
        let (_, joiner) = joiner();
        let types = vec![AssetType::new("0xbad::broken::B"), AssetType::new("0x0002::sui::SUI")];
        let join = joiner.join(&types).await;

        assert!(join.is_error);
        assert!(!join.is_success);
        assert_eq!(join.data.len(), 2);
        assert!(join.data[0].is_none());
        assert_eq!(join.data[1].as_ref().unwrap().decimals, 9);
        assert_eq!(join.get(&AssetType::new("0x2::sui::SUI")).unwrap().decimals, 9);
    }

    #[tokio::test]
    async fn duplicates_are_queried_once_and_cached() {
        let (client, joiner) = joiner();
        let sui = AssetType::new("0x2::sui::SUI");
        let join = joiner.join(&[sui.clone(), AssetType::new("0x02::sui::SUI")]).await;
        assert!(join.is_success);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        joiner.join(&[sui.clone()]).await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        joiner.invalidate();
        joiner.join(&[sui]).await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entries_are_refetched() {
        let (client, joiner) = joiner();
        let sui = AssetType::new("0x2::sui::SUI");
        joiner.join(&[sui.clone()]).await;
        tokio::time::advance(Duration::from_secs(31)).await;
        joiner.join(&[sui]).await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cached_reports_pending_for_unknown_types() {
        let (_, joiner) = joiner();
        let sui = AssetType::new("0x2::sui::SUI");
        let before = joiner.cached(&[sui.clone()]);
        assert!(before.is_pending);

        joiner.join(&[sui.clone()]).await;
        let after = joiner.cached(&[sui]);
        assert!(!after.is_pending);
        assert!(after.is_success);
    }
}
