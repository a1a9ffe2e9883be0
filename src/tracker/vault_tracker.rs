use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::config::{Config, DEFAULT_CHAIN, DEFAULT_METADATA_STALE_MS, DEFAULT_SETTLE_DELAY_MS};
use crate::notifications::NotificationQueue;
use crate::traits::{
    AccountProvider, ChainQueryClient, TransactionBuilder, TransactionExecutor, VaultEventHandler,
};
use crate::tracker::aggregator::{CapabilityPolicy, VaultAggregator, VaultLayout};
use crate::tracker::metadata::MetadataJoiner;
use crate::tracker::refresh::{RefreshHandle, RefreshOutcome, RefreshReason, RefreshScheduler};
use crate::tracker::store::{VaultStore, ViewReader};
use crate::tracker::withdrawal::WithdrawalCoordinator;

/// Knobs for [`VaultTracker::start`].
#[derive(Debug, Clone)]
pub struct TrackerOptions {
    pub package_id: String,
    pub layout: VaultLayout,
    pub policy: CapabilityPolicy,
    pub chain: String,
    pub settle_delay: Duration,
    pub metadata_stale_after: Duration,
    pub tick_interval: Option<Duration>,
}

impl TrackerOptions {
    pub fn new(package_id: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            layout: VaultLayout::default(),
            policy: CapabilityPolicy::default(),
            chain: DEFAULT_CHAIN.to_string(),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            metadata_stale_after: Duration::from_millis(DEFAULT_METADATA_STALE_MS),
            tick_interval: None,
        }
    }
}

impl From<&Config> for TrackerOptions {
    fn from(config: &Config) -> Self {
        Self {
            package_id: config.package_id.clone(),
            layout: config.layout.clone(),
            policy: config.capability_policy.clone(),
            chain: config.chain.clone(),
            settle_delay: config.settle_delay,
            metadata_stale_after: config.metadata_stale_after,
            tick_interval: config.tick_interval,
        }
    }
}

/// Main vault tracker: owns the refresh task and exposes the view.
pub struct VaultTracker {
    reader: ViewReader,
    refresh: RefreshHandle,
    notifications: NotificationQueue,
    chain: String,
    settle_delay: Duration,
    tasks: Vec<JoinHandle<()>>,
}

impl VaultTracker {
    /// Wire the components, spawn the refresh task and request the initial
    /// load. Must be called inside a tokio runtime.
    pub fn start(
        client: Arc<dyn ChainQueryClient>,
        session: Arc<dyn AccountProvider>,
        handler: Arc<dyn VaultEventHandler>,
        options: TrackerOptions,
    ) -> Self {
        let (writer, reader) = VaultStore::new();
        let metadata = MetadataJoiner::new(client.clone(), options.metadata_stale_after);
        let aggregator =
            VaultAggregator::new(client, metadata, writer, options.layout, options.policy);

        let notifications = NotificationQueue::new(handler);
        let (refresh, queue) = RefreshHandle::channel();
        let scheduler = RefreshScheduler::new(aggregator, session, options.package_id)
            .with_notifications(notifications.clone());

        let mut tasks = vec![tokio::spawn(scheduler.run(queue))];
        refresh.request(RefreshReason::Initial);

        if let Some(every) = options.tick_interval {
            info!("Polling vault every {}ms", every.as_millis());
            tasks.push(spawn_polling(refresh.clone(), every));
        }

        Self {
            reader,
            refresh,
            notifications,
            chain: options.chain,
            settle_delay: options.settle_delay,
            tasks,
        }
    }

    pub fn reader(&self) -> ViewReader {
        self.reader.clone()
    }

    pub fn refresh_handle(&self) -> RefreshHandle {
        self.refresh.clone()
    }

    /// Re-read the vault now, e.g. after a deposit made elsewhere.
    pub async fn refresh_data(&self) -> anyhow::Result<RefreshOutcome> {
        self.refresh.refresh(RefreshReason::Manual).await
    }

    /// A coordinator bound to this tracker's view, refresh queue and
    /// handlers. Withdrawals need a signer, so this is opt-in.
    pub fn withdrawal_coordinator(
        &self,
        builder: Arc<dyn TransactionBuilder>,
        executor: Arc<dyn TransactionExecutor>,
    ) -> WithdrawalCoordinator {
        WithdrawalCoordinator::new(
            self.reader(),
            builder,
            executor,
            self.refresh_handle(),
            self.chain.clone(),
            self.settle_delay,
        )
        .with_notifications(self.notifications.clone())
    }

    /// Stop polling and the refresh task, then drain the handlers.
    pub fn shutdown(self) {
        info!("Shutting down vault tracker");
        for task in &self.tasks {
            task.abort();
        }
        self.notifications.shutdown();
    }
}

fn spawn_polling(refresh: RefreshHandle, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick fires immediately and the initial load is already queued
        ticker.tick().await;
        loop {
            ticker.tick().await;
            refresh.request(RefreshReason::Poll);
        }
    })
}
