//! Concrete collaborators: chain reads, account source, withdraw call builder

pub mod move_call;
pub mod rpc_provider;
pub mod session;

// Re-export for convenience
pub use move_call::MoveCallBuilder;
pub use rpc_provider::SuiRpcClient;
pub use session::StaticAccountProvider;
