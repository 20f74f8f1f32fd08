//! Session sync loop
//!
//! Polls the store on a fixed interval and replaces the table's chat and
//! roster wholesale. The task stops when told to or when its handle is
//! dropped, so nothing touches the table after the client leaves.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::TableController;
use crate::config::Config;

/// Handle to a running sync task
pub struct SyncHandle {
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Start refreshing `table` every `period`
    pub fn spawn(table: Arc<TableController>, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the table was just loaded
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => table.refresh().await,
                    _ = shutdown_rx.changed() => {
                        debug!("Sync loop stopping");
                        break;
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            handle: Some(handle),
        }
    }

    /// Start refreshing `table` at the configured poll interval
    pub fn from_config(table: Arc<TableController>, config: &Config) -> Self {
        Self::spawn(table, config.poll_interval())
    }

    /// Stop the loop and wait for it to finish
    pub async fn stop(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatMessage;
    use crate::oracle::OracleClient;
    use crate::session::{reference_sessions, User};
    use crate::store::{GameStore, MemoryStore};
    use crate::config::OracleConfig;

    async fn player_table(store: Arc<MemoryStore>) -> Arc<TableController> {
        TableController::open(
            store,
            OracleClient::shared(OracleConfig::default()),
            reference_sessions()[0].clone(),
            User::new("watcher"),
            None,
        )
        .await
    }

    #[tokio::test]
    async fn test_sync_picks_up_other_writers() {
        let store = Arc::new(MemoryStore::seeded());
        let table = player_table(store.clone()).await;
        let sync = SyncHandle::spawn(table.clone(), Duration::from_millis(20));

        store
            .append_chat_message("1", &ChatMessage::system("from elsewhere"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        let messages = table.snapshot().await.messages;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "from elsewhere");

        sync.stop().await;
    }

    #[tokio::test]
    async fn test_loop_uses_configured_interval() {
        let store = Arc::new(MemoryStore::seeded());
        let table = player_table(store.clone()).await;
        let config = Config {
            poll_interval_ms: 20,
            ..Config::default()
        };
        let sync = SyncHandle::from_config(table.clone(), &config);

        store
            .append_chat_message("1", &ChatMessage::system("polled"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(table.snapshot().await.messages.len(), 1);

        sync.stop().await;
    }

    #[tokio::test]
    async fn test_stopped_loop_no_longer_refreshes() {
        let store = Arc::new(MemoryStore::seeded());
        let table = player_table(store.clone()).await;
        let sync = SyncHandle::spawn(table.clone(), Duration::from_millis(20));
        assert!(sync.is_running());
        sync.stop().await;

        store
            .append_chat_message("1", &ChatMessage::system("too late"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(table.snapshot().await.messages.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_handle_stops_loop() {
        let store = Arc::new(MemoryStore::seeded());
        let table = player_table(store.clone()).await;
        {
            let _sync = SyncHandle::spawn(table.clone(), Duration::from_millis(20));
        }
        tokio::time::sleep(Duration::from_millis(30)).await;

        store
            .append_chat_message("1", &ChatMessage::system("too late"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(table.snapshot().await.messages.is_empty());
        // Only the test holds the table now
        assert_eq!(Arc::strong_count(&table), 1);
    }
}
