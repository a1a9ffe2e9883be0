use std::sync::Arc;
use async_trait::async_trait;

use crate::errors::VaultError;
use crate::models::{VaultDiff, VaultView, WithdrawalReport};
use crate::traits::event_handler::VaultEventHandler;

/// Fans every event out to a list of handlers, in insertion order
pub struct CompositeEventHandler {
    handlers: Vec<Arc<dyn VaultEventHandler>>,
}

impl CompositeEventHandler {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn VaultEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn with_handler(mut self, handler: Arc<dyn VaultEventHandler>) -> Self {
        self.add_handler(handler);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for CompositeEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VaultEventHandler for CompositeEventHandler {
    async fn handle_view_update(&self, view: &VaultView, diff: &VaultDiff) {
        for handler in &self.handlers {
            handler.handle_view_update(view, diff).await;
        }
    }

    async fn handle_withdrawal(&self, report: &WithdrawalReport) {
        for handler in &self.handlers {
            handler.handle_withdrawal(report).await;
        }
    }

    async fn handle_error(&self, error: &VaultError) {
        for handler in &self.handlers {
            handler.handle_error(error).await;
        }
    }
}
