use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::errors::{ResolutionError, VaultError, VaultResult};
use crate::models::{
    Address, AssetMembership, AssetObject, AssetType, DisplayRow, ObjectDescriptor, ObjectFilter,
    ObjectId, ObjectOptions, VaultHandle, VaultView,
};
use crate::traits::chain_client::ChainQueryClient;
use crate::tracker::metadata::{MetadataJoin, MetadataJoiner};
use crate::tracker::store::{ViewReader, ViewWriter};
use crate::utils::asset_type::{
    extract_type_param, format_for_display, normalize_address, symbol_from_type, UNKNOWN_ASSET,
};
use crate::utils::helper::{format_units, is_zero_amount};

/// Field of the capability object that points at its vault.
const CAP_VAULT_FIELD: &str = "vault_id";
/// Field of a coin/balance object holding the amount.
const BALANCE_FIELD: &str = "balance";

/// What to do when an owner holds more than one capability object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CapabilityPolicy {
    /// Refuse and list the candidates.
    #[default]
    Reject,
    /// Take the first one the node returns. Known limitation: node order is
    /// not a meaningful choice.
    First,
    /// Use this capability, which must be among the owned ones.
    Explicit(ObjectId),
}

/// Where the capability struct lives inside the vault package.
#[derive(Debug, Clone)]
pub struct VaultLayout {
    pub module: String,
    pub cap_struct: String,
}

impl Default for VaultLayout {
    fn default() -> Self {
        Self {
            module: "sea_vault".to_string(),
            cap_struct: "OwnerCap".to_string(),
        }
    }
}

impl VaultLayout {
    pub fn cap_type(&self, package_id: &str) -> String {
        format!("{}::{}::{}", package_id, self.module, self.cap_struct)
    }
}

/// Turns a vault id into the published [`VaultView`].
///
/// Holds the only [`ViewWriter`]; nothing else can change inventory data.
pub struct VaultAggregator {
    client: Arc<dyn ChainQueryClient>,
    metadata: MetadataJoiner,
    writer: ViewWriter,
    layout: VaultLayout,
    policy: CapabilityPolicy,
}

impl VaultAggregator {
    pub fn new(
        client: Arc<dyn ChainQueryClient>,
        metadata: MetadataJoiner,
        writer: ViewWriter,
        layout: VaultLayout,
        policy: CapabilityPolicy,
    ) -> Self {
        Self {
            client,
            metadata,
            writer,
            layout,
            policy,
        }
    }

    pub fn reader(&self) -> ViewReader {
        self.writer.reader()
    }

    pub fn metadata(&self) -> &MetadataJoiner {
        &self.metadata
    }

    /// Find the owner's capability object and the vault it controls.
    #[instrument(skip(self, owner), fields(%owner))]
    pub async fn resolve_vault(&self, owner: &Address, package_id: &str) -> VaultResult<VaultHandle> {
        let filter = ObjectFilter::StructType(self.layout.cap_type(package_id));
        let caps = self.client.get_owned_objects(owner, &filter).await?;

        let cap = match (caps.len(), &self.policy) {
            (0, _) => {
                return Err(ResolutionError::NotFound {
                    owner: owner.to_string(),
                }
                .into())
            }
            (_, CapabilityPolicy::Explicit(wanted)) => caps
                .iter()
                .find(|cap| &cap.object_id == wanted)
                .ok_or_else(|| ResolutionError::NotFound {
                    owner: owner.to_string(),
                })?,
            (1, _) => &caps[0],
            (_, CapabilityPolicy::First) => {
                warn!(
                    "{} capability objects owned by {}, using the first ({})",
                    caps.len(),
                    owner,
                    caps[0].object_id
                );
                &caps[0]
            }
            (_, CapabilityPolicy::Reject) => {
                return Err(ResolutionError::Ambiguous {
                    candidates: caps.into_iter().map(|cap| cap.object_id).collect(),
                }
                .into())
            }
        };

        let vault_id = cap
            .field_str(CAP_VAULT_FIELD)
            .map(ObjectId::new)
            .ok_or_else(|| ResolutionError::MalformedCapability(cap.object_id.clone()))?;

        info!("Resolved vault {} via capability {}", vault_id, cap.object_id);
        Ok(VaultHandle {
            vault_id,
            capability_id: cap.object_id.clone(),
        })
    }

    /// Current member list of the vault. An empty vault is an empty list.
    pub async fn list_members(&self, vault_id: &ObjectId) -> VaultResult<Vec<AssetMembership>> {
        let members = self.client.get_dynamic_fields(vault_id).await?;
        debug!("Vault {} has {} members", vault_id, members.len());
        Ok(members)
    }

    /// Fetch and decode member objects, in request order. `None` marks an
    /// object the node did not return or whose content could not be read.
    ///
    /// Descriptors are matched to ids by their own object id, so a short or
    /// reordered batch only drops the missing entries.
    pub async fn fetch_objects(&self, ids: &[ObjectId]) -> VaultResult<Vec<Option<AssetObject>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let descriptors = self
            .client
            .multi_get_objects(ids, ObjectOptions::default())
            .await?;

        if descriptors.len() != ids.len() {
            warn!(
                "Requested {} objects, node returned {}",
                ids.len(),
                descriptors.len()
            );
        }

        let mut by_id: HashMap<ObjectId, ObjectDescriptor> = descriptors
            .into_iter()
            .flatten()
            .map(|d| (d.object_id.clone(), d))
            .collect();

        Ok(ids
            .iter()
            .map(|id| {
                let decoded = by_id.remove(id).as_ref().and_then(decode_asset_object);
                if decoded.is_none() {
                    warn!("Dropping vault member {}: content missing or undecodable", id);
                }
                decoded
            })
            .collect())
    }

    /// Rebuild the view for `handle` and publish it.
    #[instrument(skip(self, handle), fields(vault = %handle.vault_id))]
    pub async fn aggregate(&self, handle: &VaultHandle) -> VaultResult<Arc<VaultView>> {
        let previous = self.writer.current();

        let members = self.list_members(&handle.vault_id).await?;
        let member_names: Vec<String> = members.iter().map(|m| m.name.clone()).collect();
        let ids: Vec<ObjectId> = members.iter().map(|m| m.object_id.clone()).collect();

        if previous.generation == 0 && !ids.is_empty() {
            self.writer.publish(VaultView {
                loading: true,
                member_names: Arc::new(member_names.clone()),
                handle: Some(handle.clone()),
                ..VaultView::default()
            });
        }

        // drop undecodable objects before deriving the type list, so the
        // metadata query only ever sees surviving assets
        let objects: Vec<AssetObject> = self.fetch_objects(&ids).await?.into_iter().flatten().collect();
        let dropped = ids.len() - objects.len();

        let typed: Vec<(ObjectId, AssetType)> = objects
            .iter()
            .filter_map(|o| {
                let full_type = o.full_type.as_ref()?;
                Some((o.object_id.clone(), normalize_address(full_type.as_str())))
            })
            .collect();
        let asset_types: Vec<AssetType> = typed.iter().map(|(_, t)| t.clone()).collect();

        let join = self.metadata.join(&asset_types).await;
        if join.is_error {
            warn!("Some metadata queries failed, affected rows shown unscaled");
        }

        let rows = build_rows(&objects, &join);
        let degraded = (dropped > 0).then(|| {
            VaultError::PartialFetch(format!(
                "{} of {} vault members could not be read",
                dropped,
                ids.len()
            ))
            .to_string()
        });

        info!(
            "Vault aggregated: {} members, {} decoded, {} non-zero rows",
            ids.len(),
            objects.len(),
            rows.len()
        );

        Ok(self.writer.publish(VaultView {
            rows: Arc::new(rows),
            loading: false,
            member_names: Arc::new(member_names),
            asset_types: Arc::new(typed),
            handle: Some(handle.clone()),
            degraded,
            ..VaultView::default()
        }))
    }

    /// Publish the empty view used when no vault can be resolved.
    pub fn publish_unresolved(&self, error: &VaultError) -> Arc<VaultView> {
        self.writer.publish(VaultView {
            degraded: Some(error.to_string()),
            ..VaultView::default()
        })
    }

    /// Publish a failed refresh without discarding the last good rows.
    pub fn publish_degraded(&self, error: &VaultError) -> Arc<VaultView> {
        let current = self.writer.current();
        self.writer.publish(VaultView {
            loading: false,
            degraded: Some(error.to_string()),
            ..(*current).clone()
        })
    }
}

fn decode_asset_object(descriptor: &ObjectDescriptor) -> Option<AssetObject> {
    descriptor.fields.as_ref()?;

    let full_type = descriptor
        .type_
        .as_deref()
        .and_then(extract_type_param);
    let raw_balance = descriptor
        .field_str(BALANCE_FIELD)
        .filter(|b| !b.trim().is_empty())
        .unwrap_or_else(|| "0".to_string());

    Some(AssetObject {
        object_id: descriptor.object_id.clone(),
        full_type,
        raw_balance,
    })
}

/// Join objects with metadata by asset type and drop zero balances.
pub fn build_rows(objects: &[AssetObject], join: &MetadataJoin) -> Vec<DisplayRow> {
    objects
        .iter()
        .filter(|object| !is_zero_amount(&object.raw_balance))
        .map(|object| {
            let metadata = object.full_type.as_ref().and_then(|t| join.get(t)).cloned();

            let (symbol, display_type) = match &object.full_type {
                // the type path names the asset; metadata only scales it
                Some(full_type) => (
                    symbol_from_type(full_type.as_str()),
                    format_for_display(full_type.as_str()),
                ),
                None => (UNKNOWN_ASSET.to_string(), UNKNOWN_ASSET.to_string()),
            };

            let display_amount = metadata
                .as_ref()
                .and_then(|m| format_units(&object.raw_balance, m.decimals))
                .unwrap_or_else(|| object.raw_balance.clone());

            DisplayRow {
                object_id: object.object_id.clone(),
                symbol,
                display_type,
                raw_amount: object.raw_balance.clone(),
                full_type: object.full_type.clone(),
                metadata,
                display_amount,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(id: &str, type_: Option<&str>, fields: Option<serde_json::Value>) -> ObjectDescriptor {
        ObjectDescriptor {
            object_id: ObjectId::new(id),
            type_: type_.map(str::to_string),
            fields,
        }
    }

    #[test]
    fn decodes_coin_objects() {
        let d = descriptor(
            "0x1",
            Some("0x2::coin::Coin<0x2::sui::SUI>"),
            Some(json!({ "balance": "500" })),
        );
        let object = decode_asset_object(&d).unwrap();
        assert_eq!(object.full_type.unwrap().as_str(), "0x2::sui::SUI");
        assert_eq!(object.raw_balance, "500");
    }

    #[test]
    fn content_is_required() {
        let d = descriptor("0x1", Some("0x2::coin::Coin<0x2::sui::SUI>"), None);
        assert!(decode_asset_object(&d).is_none());
    }

    #[test]
    fn missing_balance_reads_as_zero() {
        let d = descriptor("0x1", Some("0x2::coin::Coin<0x2::sui::SUI>"), Some(json!({})));
        assert_eq!(decode_asset_object(&d).unwrap().raw_balance, "0");
    }

    #[test]
    fn empty_balance_is_zero_and_hidden() {
        let d = descriptor(
            "0x1",
            Some("0x2::coin::Coin<0x2::sui::SUI>"),
            Some(json!({ "balance": "" })),
        );
        let object = decode_asset_object(&d).unwrap();
        assert_eq!(object.raw_balance, "0");
        assert!(build_rows(&[object], &MetadataJoin::default()).is_empty());
    }

    #[test]
    fn unknown_types_render_as_unknown() {
        let objects = vec![AssetObject {
            object_id: ObjectId::new("0x1"),
            full_type: None,
            raw_balance: "77".to_string(),
        }];
        let rows = build_rows(&objects, &MetadataJoin::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].symbol, UNKNOWN_ASSET);
        assert_eq!(rows[0].display_type, UNKNOWN_ASSET);
        assert_eq!(rows[0].display_amount, "77");
        assert!(rows[0].metadata.is_none());
    }

    #[test]
    fn cap_type_uses_layout() {
        let layout = VaultLayout::default();
        assert_eq!(layout.cap_type("0xabc"), "0xabc::sea_vault::OwnerCap");
    }
}
