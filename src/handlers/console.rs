use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::errors::VaultError;
use crate::models::{VaultDiff, VaultView, WithdrawalReport};
use crate::traits::event_handler::VaultEventHandler;
use crate::utils::helper::truncate_string;

const SYMBOL_WIDTH: usize = 12;

/// Console logging event handler
pub struct ConsoleEventHandler;

impl ConsoleEventHandler {
    /// Create a new console event handler
    pub fn new() -> Self {
        Self
    }

    fn log_view(&self, view: &VaultView) {
        info!("{}", "=".repeat(80));
        match &view.handle {
            Some(handle) => info!("Vault {} (generation {})", handle.vault_id, view.generation),
            None => info!("No vault resolved (generation {})", view.generation),
        }
        if let Some(reason) = &view.degraded {
            warn!("View degraded: {}", reason);
        }
        if view.loading {
            info!("Loading...");
        } else if view.rows.is_empty() {
            info!("No coins in vault");
        }

        for (i, row) in view.rows.iter().enumerate() {
            let symbol = truncate_string(&row.symbol, SYMBOL_WIDTH);
            info!("{}. {:<12} {}", i + 1, symbol, row.display_amount);
            info!("   Type: {}", row.display_type);
            info!("   Object: {}", row.object_id);
            if row.metadata.is_none() {
                info!("   Decimals unknown, amount shown in smallest units");
            }
        }
        info!("{}", "=".repeat(80));
    }
}

impl Default for ConsoleEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VaultEventHandler for ConsoleEventHandler {
    async fn handle_view_update(&self, view: &VaultView, diff: &VaultDiff) {
        // the first publish of a session lists every row as added
        if view.generation <= 1 || !diff.is_empty() || view.degraded.is_some() {
            self.log_view(view);
        }
        if diff.is_empty() {
            return;
        }

        info!("Vault changes detected:");
        for added in &diff.added {
            info!("  + {} {}", added.symbol, added.display_amount);
        }
        for removed in &diff.removed {
            info!("  - {}", removed.symbol);
        }
        for change in &diff.changes {
            let indicator = match change.delta() {
                Some(d) if d > 0 => "↑",
                Some(d) if d < 0 => "↓",
                _ => "~",
            };
            info!(
                "  {} {}: {} → {} (smallest units)",
                indicator, change.symbol, change.old_amount, change.new_amount
            );
        }
    }

    async fn handle_withdrawal(&self, report: &WithdrawalReport) {
        match (&report.result, &report.intent) {
            (Ok(digest), Some(intent)) => info!(
                "Withdrew {} of {} (tx {})",
                intent.amount_smallest_units, intent.asset_type, digest
            ),
            (Ok(digest), None) => info!("Withdrawal from {} landed (tx {})", report.object_id, digest),
            (Err(reason), _) => error!("Failed to withdraw from {}: {}", report.object_id, reason),
        }
    }

    async fn handle_error(&self, error: &VaultError) {
        error!("Vault tracker error: {}", error);
    }
}
