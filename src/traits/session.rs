use crate::models::Address;

/// Source of the currently connected account
pub trait AccountProvider: Send + Sync {
    fn current_address(&self) -> Option<Address>;
}
