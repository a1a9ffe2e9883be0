//! Vault aggregation, refresh scheduling and withdrawals

pub mod aggregator;
pub mod metadata;
pub mod refresh;
pub mod store;
pub mod vault_tracker;
pub mod withdrawal;

pub use aggregator::{CapabilityPolicy, VaultAggregator, VaultLayout};
pub use metadata::{MetadataJoin, MetadataJoiner};
pub use refresh::{RefreshHandle, RefreshOutcome, RefreshReason, RefreshScheduler};
pub use store::{VaultStore, ViewReader, ViewWriter};
pub use vault_tracker::{TrackerOptions, VaultTracker};
pub use withdrawal::{validate_withdrawal_amount, WithdrawalCoordinator};
