use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::asset::{AssetMetadata, AssetType, ObjectId, VaultHandle};

/// One renderable holding of the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub object_id: ObjectId,
    pub symbol: String,
    /// Elided form of `full_type`, or `"Unknown"`.
    pub display_type: String,
    /// Balance in smallest units, kept as a decimal string.
    pub raw_amount: String,
    pub full_type: Option<AssetType>,
    /// Metadata joined by `full_type`; `None` renders degraded.
    pub metadata: Option<AssetMetadata>,
    /// `raw_amount` scaled by the metadata decimals, or the raw amount
    /// unscaled when metadata is missing.
    pub display_amount: String,
}

impl DisplayRow {
    pub fn decimals(&self) -> Option<u8> {
        self.metadata.as_ref().map(|m| m.decimals)
    }

    /// Format row amount with symbol
    pub fn formatted_amount(&self) -> String {
        format!("{} {}", self.display_amount, self.symbol)
    }
}

/// Snapshot of the vault as last published by the aggregator.
///
/// Readers always see a whole snapshot; the aggregator replaces it, never
/// edits it.
#[derive(Debug, Clone, Default)]
pub struct VaultView {
    pub rows: Arc<Vec<DisplayRow>>,
    /// Set only while the first load of a non-empty vault is outstanding.
    pub loading: bool,
    /// Names of every vault member, including zero balances.
    pub member_names: Arc<Vec<String>>,
    /// Normalized asset type of every decoded member, in member order.
    pub asset_types: Arc<Vec<(ObjectId, AssetType)>>,
    pub handle: Option<VaultHandle>,
    /// Why the view is empty or partial, if it is.
    pub degraded: Option<String>,
    pub generation: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl VaultView {
    pub fn row(&self, object_id: &ObjectId) -> Option<&DisplayRow> {
        self.rows.iter().find(|row| &row.object_id == object_id)
    }

    pub fn row_index(&self, object_id: &ObjectId) -> Option<usize> {
        self.rows.iter().position(|row| &row.object_id == object_id)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Compare with an older view and return differences
    pub fn diff_from(&self, old: &VaultView) -> VaultDiff {
        let mut diff = VaultDiff::default();
        let old_rows: HashMap<&ObjectId, &DisplayRow> =
            old.rows.iter().map(|row| (&row.object_id, row)).collect();

        for row in self.rows.iter() {
            match old_rows.get(&row.object_id) {
                Some(old_row) if old_row.raw_amount != row.raw_amount => {
                    diff.changes.push(RowChange {
                        object_id: row.object_id.clone(),
                        symbol: row.symbol.clone(),
                        old_amount: old_row.raw_amount.clone(),
                        new_amount: row.raw_amount.clone(),
                    });
                }
                Some(_) => {}
                None => diff.added.push(row.clone()),
            }
        }

        for old_row in old.rows.iter() {
            if self.row(&old_row.object_id).is_none() {
                diff.removed.push(old_row.clone());
            }
        }

        diff
    }
}

/// Difference between two consecutive vault views
#[derive(Debug, Default, Clone)]
pub struct VaultDiff {
    pub added: Vec<DisplayRow>,
    pub removed: Vec<DisplayRow>,
    pub changes: Vec<RowChange>,
}

impl VaultDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changes.is_empty()
    }
}

/// Change in a row's raw balance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowChange {
    pub object_id: ObjectId,
    pub symbol: String,
    pub old_amount: String,
    pub new_amount: String,
}

impl RowChange {
    /// Signed change in smallest units, when both sides parse.
    pub fn delta(&self) -> Option<i128> {
        let old: i128 = self.old_amount.parse().ok()?;
        let new: i128 = self.new_amount.parse().ok()?;
        Some(new - old)
    }
}
