//! Data models for the vault tracker

pub mod asset;
pub mod view;
pub mod withdrawal;

// Re-export for convenience
pub use asset::{
    Address, AssetMembership, AssetMetadata, AssetObject, AssetType, ObjectDescriptor,
    ObjectFilter, ObjectId, ObjectOptions, VaultHandle,
};
pub use view::{DisplayRow, RowChange, VaultDiff, VaultView};
pub use withdrawal::{
    ExecutionResult, TransactionIntent, WithdrawalIntent, WithdrawalOutcome, WithdrawalReport,
    WithdrawalState,
};
