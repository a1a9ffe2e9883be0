//! Collaborator traits for the vault tracker

pub mod chain_client;
pub mod event_handler;
pub mod session;
pub mod transaction;

// Re-export for convenience
pub use chain_client::ChainQueryClient;
pub use event_handler::VaultEventHandler;
pub use session::AccountProvider;
pub use transaction::{TransactionBuilder, TransactionExecutor};
