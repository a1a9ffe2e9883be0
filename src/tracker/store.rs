//! Shared "coins in vault" view.
//!
//! [`VaultStore::new`] hands out exactly one [`ViewWriter`], which the
//! aggregator takes by value; everything else gets [`ViewReader`]s. Writes
//! swap in a whole new [`VaultView`], so a reader never observes a
//! half-updated list.

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::{DisplayRow, VaultView};

pub struct VaultStore;

impl VaultStore {
    pub fn new() -> (ViewWriter, ViewReader) {
        let (tx, rx) = watch::channel(Arc::new(VaultView::default()));
        (ViewWriter { tx }, ViewReader { rx })
    }
}

/// The single write handle. Not `Clone`.
pub struct ViewWriter {
    tx: watch::Sender<Arc<VaultView>>,
}

impl ViewWriter {
    /// Replace the published view, stamping the next generation.
    pub fn publish(&self, mut view: VaultView) -> Arc<VaultView> {
        view.generation = self.tx.borrow().generation + 1;
        view.updated_at = Some(chrono::Utc::now());
        let view = Arc::new(view);
        self.tx.send_replace(view.clone());
        view
    }

    pub fn current(&self) -> Arc<VaultView> {
        self.tx.borrow().clone()
    }

    pub fn reader(&self) -> ViewReader {
        ViewReader {
            rx: self.tx.subscribe(),
        }
    }
}

#[derive(Clone)]
pub struct ViewReader {
    rx: watch::Receiver<Arc<VaultView>>,
}

impl ViewReader {
    pub fn current(&self) -> Arc<VaultView> {
        self.rx.borrow().clone()
    }

    pub fn rows(&self) -> Arc<Vec<DisplayRow>> {
        self.rx.borrow().rows.clone()
    }

    pub fn loading(&self) -> bool {
        self.rx.borrow().loading
    }

    /// Wait for the next publish. Errors once the writer is gone.
    pub async fn changed(&mut self) -> anyhow::Result<Arc<VaultView>> {
        self.rx
            .changed()
            .await
            .map_err(|_| anyhow::anyhow!("vault view writer dropped"))?;
        Ok(self.rx.borrow_and_update().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn readers_see_whole_replacements() {
        let (writer, mut reader) = VaultStore::new();
        assert_eq!(reader.current().generation, 0);

        let other = reader.clone();
        writer.publish(VaultView {
            loading: true,
            ..VaultView::default()
        });

        let seen = reader.changed().await.unwrap();
        assert_eq!(seen.generation, 1);
        assert!(seen.loading);
        assert!(other.loading());

        writer.publish(VaultView::default());
        assert_eq!(other.current().generation, 2);
        assert!(!other.loading());
    }

    #[tokio::test]
    async fn changed_fails_after_writer_drops() {
        let (writer, mut reader) = VaultStore::new();
        drop(writer);
        assert!(reader.changed().await.is_err());
    }
}
