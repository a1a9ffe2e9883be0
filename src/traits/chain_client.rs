use async_trait::async_trait;

use crate::models::{
    Address, AssetMembership, AssetMetadata, AssetType, ObjectDescriptor, ObjectFilter, ObjectId,
    ObjectOptions,
};

/// Core trait for reading vault state from the chain
#[async_trait]
pub trait ChainQueryClient: Send + Sync {
    /// All objects owned by `owner` matching `filter`, every page.
    async fn get_owned_objects(
        &self,
        owner: &Address,
        filter: &ObjectFilter,
    ) -> anyhow::Result<Vec<ObjectDescriptor>>;

    /// Objects by id, in request order. `None` where the node returned an
    /// error for that id.
    async fn multi_get_objects(
        &self,
        ids: &[ObjectId],
        options: ObjectOptions,
    ) -> anyhow::Result<Vec<Option<ObjectDescriptor>>>;

    /// Dynamic fields attached to `parent`, every page.
    async fn get_dynamic_fields(&self, parent: &ObjectId) -> anyhow::Result<Vec<AssetMembership>>;

    /// Coin metadata for an asset type, `None` if none is published.
    async fn get_coin_metadata(&self, asset_type: &AssetType) -> anyhow::Result<Option<AssetMetadata>>;
}
