use async_trait::async_trait;

use crate::errors::VaultError;
use crate::models::{VaultDiff, VaultView, WithdrawalReport};

/// Handler for vault events
#[async_trait]
pub trait VaultEventHandler: Send + Sync {
    /// Handle a newly published view and its difference from the previous one
    async fn handle_view_update(&self, view: &VaultView, diff: &VaultDiff);

    /// Handle the outcome of a withdrawal submission
    async fn handle_withdrawal(&self, report: &WithdrawalReport);

    /// Handle error - using reference to avoid cloning issues
    async fn handle_error(&self, error: &VaultError);
}
