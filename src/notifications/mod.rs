// src/notifications/mod.rs
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedSender, UnboundedReceiver, unbounded_channel};
use tracing::{error, warn};

use crate::errors::VaultError;
use crate::models::{VaultDiff, VaultView, WithdrawalReport};
use crate::traits::event_handler::VaultEventHandler;

/// Notification types
#[derive(Debug)]
pub enum Notification {
    ViewUpdated(Arc<VaultView>, VaultDiff),
    Withdrawal(WithdrawalReport),
    Error(VaultError),
    Shutdown,
}

/// Notification queue for async processing
pub struct NotificationQueue {
    sender: UnboundedSender<Notification>,
    handler: Arc<dyn VaultEventHandler>,
}

impl NotificationQueue {
    /// Create a new notification queue
    pub fn new(handler: Arc<dyn VaultEventHandler>) -> Self {
        let (sender, receiver) = unbounded_channel();

        // Handlers may be slow; keep them off the refresh and withdrawal paths
        tokio::spawn(Self::process_notifications(receiver, handler.clone()));

        Self { sender, handler }
    }

    /// Process notifications in a separate task
    async fn process_notifications(
        mut receiver: UnboundedReceiver<Notification>,
        handler: Arc<dyn VaultEventHandler>,
    ) {
        while let Some(notification) = receiver.recv().await {
            match notification {
                Notification::ViewUpdated(view, diff) => {
                    handler.handle_view_update(&view, &diff).await;
                }
                Notification::Withdrawal(report) => {
                    handler.handle_withdrawal(&report).await;
                }
                Notification::Error(err) => {
                    handler.handle_error(&err).await;
                }
                Notification::Shutdown => {
                    warn!("Notification processor shutting down");
                    break;
                }
            }
        }
    }

    fn send(&self, notification: Notification) {
        if let Err(e) = self.sender.send(notification) {
            error!("Failed to queue notification: {}", e);
        }
    }

    /// Queue a published view (non-blocking)
    pub fn notify_view_update(&self, view: Arc<VaultView>, diff: VaultDiff) {
        self.send(Notification::ViewUpdated(view, diff));
    }

    /// Queue a withdrawal outcome (non-blocking)
    pub fn notify_withdrawal(&self, report: WithdrawalReport) {
        self.send(Notification::Withdrawal(report));
    }

    /// Queue an error notification (non-blocking)
    pub fn notify_error(&self, error: VaultError) {
        self.send(Notification::Error(error));
    }

    /// Stop the processing task once queued notifications are handled
    pub fn shutdown(&self) {
        self.send(Notification::Shutdown);
    }

    pub fn handler(&self) -> &Arc<dyn VaultEventHandler> {
        &self.handler
    }
}

impl Clone for NotificationQueue {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            handler: self.handler.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VaultEventHandler for Recorder {
        async fn handle_view_update(&self, view: &VaultView, _diff: &VaultDiff) {
            self.events.lock().await.push(format!("view {}", view.generation));
        }

        async fn handle_withdrawal(&self, report: &WithdrawalReport) {
            self.events.lock().await.push(format!("withdrawal {}", report.object_id));
        }

        async fn handle_error(&self, error: &VaultError) {
            self.events.lock().await.push(format!("error {}", error));
        }
    }

    #[tokio::test]
    async fn delivers_in_order_until_shutdown() {
        let recorder = Arc::new(Recorder::default());
        let queue = NotificationQueue::new(recorder.clone());

        queue.notify_view_update(
            Arc::new(VaultView {
                generation: 3,
                ..VaultView::default()
            }),
            VaultDiff::default(),
        );
        queue.notify_error(VaultError::PartialFetch("object 0x1".to_string()));
        queue.shutdown();
        queue.notify_view_update(Arc::new(VaultView::default()), VaultDiff::default());

        // wait for the processor to drain
        for _ in 0..50 {
            if recorder.events.lock().await.len() >= 2 {
                break;
            }
            tokio::task::yield_now().await;
        }
        tokio::task::yield_now().await;

        let events = recorder.events.lock().await.clone();
        assert_eq!(
            events,
            vec![
                "view 3".to_string(),
                "error partial fetch failure: object 0x1".to_string()
            ]
        );
    }
}
