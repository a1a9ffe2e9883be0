//! Explicit refresh commands.
//!
//! Callers hold a cloneable [`RefreshHandle`]; one [`RefreshScheduler`] task
//! owns the aggregator and serves the queue. Every command that is queued
//! while a pass is pending is folded into that pass, and each caller gets the
//! pass's [`RefreshOutcome`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{ResolutionError, VaultError, VaultResult};
use crate::models::{Address, VaultHandle};
use crate::notifications::NotificationQueue;
use crate::traits::session::AccountProvider;
use crate::tracker::aggregator::VaultAggregator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    Initial,
    Manual,
    Poll,
    Deposit,
    Withdrawal,
    /// Like `Manual`, but also drops cached metadata.
    Full,
}

impl fmt::Display for RefreshReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RefreshReason::Initial => "initial",
            RefreshReason::Manual => "manual",
            RefreshReason::Poll => "poll",
            RefreshReason::Deposit => "deposit",
            RefreshReason::Withdrawal => "withdrawal",
            RefreshReason::Full => "full",
        };
        f.write_str(s)
    }
}

/// Completion signal for a refresh pass.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// Generation of the view published by this pass.
    pub generation: u64,
    /// Every reason folded into this pass.
    pub reasons: Vec<RefreshReason>,
    pub error: Option<String>,
}

impl RefreshOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug)]
pub struct RefreshCommand {
    pub reason: RefreshReason,
    done: Option<oneshot::Sender<RefreshOutcome>>,
}

#[derive(Clone)]
pub struct RefreshHandle {
    tx: mpsc::UnboundedSender<RefreshCommand>,
}

impl RefreshHandle {
    pub fn channel() -> (RefreshHandle, RefreshQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (RefreshHandle { tx }, RefreshQueue { rx })
    }

    /// Request a refresh and wait for the pass that serves it.
    pub async fn refresh(&self, reason: RefreshReason) -> anyhow::Result<RefreshOutcome> {
        let (done, rx) = oneshot::channel();
        self.tx
            .send(RefreshCommand {
                reason,
                done: Some(done),
            })
            .map_err(|_| anyhow::anyhow!("refresh scheduler stopped"))?;
        rx.await
            .map_err(|_| anyhow::anyhow!("refresh scheduler dropped the request"))
    }

    /// Request a refresh without waiting for it.
    pub fn request(&self, reason: RefreshReason) {
        if self.tx.send(RefreshCommand { reason, done: None }).is_err() {
            warn!("Refresh ({}) requested after scheduler stopped", reason);
        }
    }

    /// Request a refresh once `delay` has passed.
    pub fn schedule_after(&self, delay: Duration, reason: RefreshReason) -> JoinHandle<()> {
        let handle = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            handle.request(reason);
        })
    }
}

pub struct RefreshQueue {
    rx: mpsc::UnboundedReceiver<RefreshCommand>,
}

impl RefreshQueue {
    /// Wait for one command, then take everything else already queued.
    /// `None` once every handle is dropped.
    pub async fn next_batch(&mut self) -> Option<Vec<RefreshCommand>> {
        let first = self.rx.recv().await?;
        let mut batch = vec![first];
        while let Ok(next) = self.rx.try_recv() {
            batch.push(next);
        }
        Some(batch)
    }
}

/// Serves refresh commands against the aggregator.
pub struct RefreshScheduler {
    aggregator: VaultAggregator,
    session: Arc<dyn AccountProvider>,
    package_id: String,
    resolved: Option<(Address, VaultHandle)>,
    notifications: Option<NotificationQueue>,
}

impl RefreshScheduler {
    pub fn new(
        aggregator: VaultAggregator,
        session: Arc<dyn AccountProvider>,
        package_id: impl Into<String>,
    ) -> Self {
        Self {
            aggregator,
            session,
            package_id: package_id.into(),
            resolved: None,
            notifications: None,
        }
    }

    pub fn with_notifications(mut self, notifications: NotificationQueue) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub fn aggregator(&self) -> &VaultAggregator {
        &self.aggregator
    }

    /// Serve the queue until every [`RefreshHandle`] is dropped.
    pub async fn run(mut self, mut queue: RefreshQueue) {
        while let Some(batch) = queue.next_batch().await {
            let reasons: Vec<RefreshReason> = batch.iter().map(|c| c.reason).collect();
            if batch.len() > 1 {
                debug!("Coalesced {} refresh requests into one pass", batch.len());
            }

            let outcome = self.refresh_once(reasons).await;
            for command in batch {
                if let Some(done) = command.done {
                    let _ = done.send(outcome.clone());
                }
            }
        }
        debug!("All refresh handles dropped, scheduler exiting");
    }

    /// One full pass: (re)resolve the vault if needed, aggregate, publish.
    /// Never fails; errors degrade the view and are reported in the outcome.
    pub async fn refresh_once(&mut self, reasons: Vec<RefreshReason>) -> RefreshOutcome {
        info!("Refreshing vault ({})", join_reasons(&reasons));

        if reasons.contains(&RefreshReason::Full) {
            self.aggregator.metadata().invalidate();
        }

        let previous = self.aggregator.reader().current();
        let result = match self.current_handle().await {
            Ok(handle) => match self.aggregator.aggregate(&handle).await {
                Ok(view) => Ok(view),
                Err(e) => Err((self.aggregator.publish_degraded(&e), e)),
            },
            Err(e) => {
                self.resolved = None;
                Err((self.aggregator.publish_unresolved(&e), e))
            }
        };

        match result {
            Ok(view) => {
                if let Some(queue) = &self.notifications {
                    queue.notify_view_update(view.clone(), view.diff_from(&previous));
                }
                RefreshOutcome {
                    generation: view.generation,
                    reasons,
                    error: None,
                }
            }
            Err((view, e)) => {
                warn!("Vault refresh failed: {}", e);
                let message = e.to_string();
                if let Some(queue) = &self.notifications {
                    queue.notify_view_update(view.clone(), view.diff_from(&previous));
                    queue.notify_error(e);
                }
                RefreshOutcome {
                    generation: view.generation,
                    reasons,
                    error: Some(message),
                }
            }
        }
    }

    /// The resolved handle for the connected account, resolving again when
    /// nothing is resolved yet or the account changed.
    async fn current_handle(&mut self) -> VaultResult<VaultHandle> {
        let owner = self
            .session
            .current_address()
            .ok_or(VaultError::Resolution(ResolutionError::NotConnected))?;

        if let Some((resolved_owner, handle)) = &self.resolved {
            if resolved_owner == &owner {
                return Ok(handle.clone());
            }
            info!("Account changed from {} to {}, resolving vault again", resolved_owner, owner);
        }

        let handle = self.aggregator.resolve_vault(&owner, &self.package_id).await?;
        self.resolved = Some((owner, handle.clone()));
        Ok(handle)
    }
}

fn join_reasons(reasons: &[RefreshReason]) -> String {
    reasons
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
