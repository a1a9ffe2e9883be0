//! Event handlers for vault updates and withdrawals

pub mod console;
pub mod composite;

// Re-export for convenience
pub use console::ConsoleEventHandler;
pub use composite::CompositeEventHandler;
