use std::sync::RwLock;

use crate::models::Address;
use crate::traits::session::AccountProvider;

/// Account provider backed by a configured address that can be swapped at
/// runtime, e.g. when a wallet reconnects.
#[derive(Debug, Default)]
pub struct StaticAccountProvider {
    address: RwLock<Option<Address>>,
}

impl StaticAccountProvider {
    pub fn new(address: Option<Address>) -> Self {
        Self {
            address: RwLock::new(address),
        }
    }

    pub fn connect(&self, address: Address) {
        if let Ok(mut current) = self.address.write() {
            *current = Some(address);
        }
    }

    pub fn disconnect(&self) {
        if let Ok(mut current) = self.address.write() {
            *current = None;
        }
    }
}

impl AccountProvider for StaticAccountProvider {
    fn current_address(&self) -> Option<Address> {
        self.address.read().ok().and_then(|a| a.clone())
    }
}
