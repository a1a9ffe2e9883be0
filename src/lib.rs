//! SeaVault Tracker Library
//!
//! Reads a Sui vault's coin holdings into a display-ready view, joins coin
//! metadata, and coordinates withdrawals with a settle-delayed refresh.

// Public modules - these are the API surface
pub mod config;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod notifications;
pub mod providers;
pub mod traits;
pub mod tracker;
pub mod utils;

// Re-export commonly used items for easier access
pub use config::Config;
pub use errors::{ResolutionError, ValidationError, VaultError, VaultResult};
pub use handlers::{CompositeEventHandler, ConsoleEventHandler};
pub use models::{
    Address, AssetType, DisplayRow, ObjectId, VaultDiff, VaultHandle, VaultView,
    WithdrawalOutcome,
};
pub use providers::{MoveCallBuilder, StaticAccountProvider, SuiRpcClient};
pub use traits::{
    AccountProvider, ChainQueryClient, TransactionBuilder, TransactionExecutor, VaultEventHandler,
};
pub use tracker::{
    CapabilityPolicy, RefreshHandle, RefreshReason, TrackerOptions, VaultTracker, ViewReader,
    WithdrawalCoordinator,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
