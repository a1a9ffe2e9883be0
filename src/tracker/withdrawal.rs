use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument};

use crate::errors::{ResolutionError, ValidationError, VaultError, VaultResult};
use crate::models::{
    ObjectId, VaultView, WithdrawalIntent, WithdrawalOutcome, WithdrawalReport, WithdrawalState,
};
use crate::notifications::NotificationQueue;
use crate::traits::transaction::{TransactionBuilder, TransactionExecutor};
use crate::tracker::refresh::{RefreshHandle, RefreshReason};
use crate::tracker::store::ViewReader;
use crate::utils::asset_type::normalize_address;
use crate::utils::helper::{parse_amount, to_smallest_units};

/// Validate an entered amount against the asset precision and convert it.
///
/// Amount problems are reported before missing decimals, so `"abc"` on an
/// asset without metadata still says the amount is wrong.
pub fn validate_withdrawal_amount(entered: &str, decimals: Option<u8>) -> Result<u64, ValidationError> {
    parse_amount(entered)?;
    let decimals = decimals.ok_or_else(|| ValidationError::missing_decimals(None))?;
    to_smallest_units(entered, decimals)
}

/// Drives one withdrawal at a time from the published vault view.
pub struct WithdrawalCoordinator {
    view: ViewReader,
    builder: Arc<dyn TransactionBuilder>,
    executor: Arc<dyn TransactionExecutor>,
    refresh: RefreshHandle,
    notifications: Option<NotificationQueue>,
    amounts: DashMap<ObjectId, String>,
    in_flight: AtomicBool,
    state: watch::Sender<WithdrawalState>,
    chain: String,
    settle_delay: Duration,
}

/// Releases the in-flight flag and returns to `Idle` however `withdraw`
/// exits.
struct InFlight<'a> {
    coordinator: &'a WithdrawalCoordinator,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.coordinator.state.send_replace(WithdrawalState::Idle);
        self.coordinator.in_flight.store(false, Ordering::Release);
    }
}

impl WithdrawalCoordinator {
    pub fn new(
        view: ViewReader,
        builder: Arc<dyn TransactionBuilder>,
        executor: Arc<dyn TransactionExecutor>,
        refresh: RefreshHandle,
        chain: impl Into<String>,
        settle_delay: Duration,
    ) -> Self {
        let (state, _) = watch::channel(WithdrawalState::Idle);
        Self {
            view,
            builder,
            executor,
            refresh,
            notifications: None,
            amounts: DashMap::new(),
            in_flight: AtomicBool::new(false),
            state,
            chain: chain.into(),
            settle_delay,
        }
    }

    pub fn with_notifications(mut self, notifications: NotificationQueue) -> Self {
        self.notifications = Some(notifications);
        self
    }

    /// Record what the user typed for a row.
    pub fn set_amount(&self, object_id: &ObjectId, amount: impl Into<String>) {
        self.amounts.insert(object_id.clone(), amount.into());
    }

    pub fn amount(&self, object_id: &ObjectId) -> Option<String> {
        self.amounts.get(object_id).map(|a| a.value().clone())
    }

    pub fn clear_amount(&self, object_id: &ObjectId) {
        self.amounts.remove(object_id);
    }

    /// True while a submission is in flight; withdraw controls should be
    /// disabled.
    pub fn is_withdrawing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn state(&self) -> WithdrawalState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<WithdrawalState> {
        self.state.subscribe()
    }

    /// Withdraw the entered amount from the row holding `object_id`.
    ///
    /// Returns [`WithdrawalOutcome::Ignored`] if another withdrawal is still
    /// in flight. Validation errors submit nothing; submission errors keep
    /// the entered amount for a retry.
    #[instrument(skip(self, object_id), fields(object = %object_id))]
    pub async fn withdraw(&self, object_id: &ObjectId) -> VaultResult<WithdrawalOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Withdrawal already in flight, ignoring");
            return Ok(WithdrawalOutcome::Ignored);
        }
        let _guard = InFlight { coordinator: self };

        self.state.send_replace(WithdrawalState::Validating);
        let view = self.view.current();
        let intent = self.prepare(&view, object_id)?;

        self.state.send_replace(WithdrawalState::Submitting);
        info!(
            "Withdrawing {} smallest units of {} from vault {}",
            intent.amount_smallest_units, intent.asset_type, intent.vault_id
        );

        match self.submit(&intent).await {
            Ok(digest) => {
                self.state.send_replace(WithdrawalState::Succeeded);
                info!("Withdrawal landed: {}", digest);
                self.clear_amount(object_id);
                self.refresh
                    .schedule_after(self.settle_delay, RefreshReason::Withdrawal);
                self.report(object_id, Some(intent.clone()), Ok(digest.clone()));
                Ok(WithdrawalOutcome::Submitted { intent, digest })
            }
            Err(e) => {
                self.state.send_replace(WithdrawalState::Failed);
                let reason = format!("{:#}", e);
                error!("Withdrawal failed: {}", reason);
                self.report(object_id, Some(intent), Err(reason.clone()));
                Err(VaultError::Submission(reason))
            }
        }
    }

    fn prepare(&self, view: &VaultView, object_id: &ObjectId) -> VaultResult<WithdrawalIntent> {
        let handle = view
            .handle
            .clone()
            .ok_or(VaultError::Resolution(ResolutionError::Unresolved))?;
        let row = view
            .row(object_id)
            .ok_or_else(|| ValidationError::UnknownRow(object_id.clone()))?;

        let entered = self.amount(object_id).unwrap_or_default();
        let amount_smallest_units =
            validate_withdrawal_amount(&entered, row.decimals()).map_err(|e| match e {
                ValidationError::MissingDecimals(_) => {
                    ValidationError::missing_decimals(row.full_type.as_ref())
                }
                other => other,
            })?;

        // rows without a type carry no metadata and fail on decimals above
        let asset_type = row
            .full_type
            .as_ref()
            .map(|t| normalize_address(t.as_str()))
            .ok_or_else(|| ValidationError::MissingAssetType(object_id.clone()))?;

        Ok(WithdrawalIntent {
            vault_id: handle.vault_id,
            capability_id: handle.capability_id,
            asset_type,
            amount_smallest_units,
        })
    }

    async fn submit(&self, intent: &WithdrawalIntent) -> anyhow::Result<String> {
        let transaction = self.builder.build_withdrawal(intent)?;
        let result = self
            .executor
            .sign_and_execute(transaction, &self.chain)
            .await?;
        Ok(result.digest)
    }

    fn report(
        &self,
        object_id: &ObjectId,
        intent: Option<WithdrawalIntent>,
        result: Result<String, String>,
    ) {
        if let Some(queue) = &self.notifications {
            queue.notify_withdrawal(WithdrawalReport {
                object_id: object_id.clone(),
                intent,
                result,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_amounts() {
        for bad in ["0", "-5", "", "abc"] {
            assert!(validate_withdrawal_amount(bad, Some(9)).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn accepts_fractional_amounts_with_precision() {
        assert_eq!(validate_withdrawal_amount("1.5", Some(1)).unwrap(), 15);
        assert_eq!(validate_withdrawal_amount("1.5", Some(9)).unwrap(), 1_500_000_000);
        assert_eq!(validate_withdrawal_amount("2.5", Some(6)).unwrap(), 2_500_000);
    }

    #[test]
    fn missing_decimals_is_fatal() {
        assert!(matches!(
            validate_withdrawal_amount("1", None),
            Err(ValidationError::MissingDecimals(_))
        ));
        // amount problems win over missing decimals
        assert!(matches!(
            validate_withdrawal_amount("abc", None),
            Err(ValidationError::NotNumeric(_))
        ));
    }
}
