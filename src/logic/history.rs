use crate::models::RiskHistoryRecord;
use crate::stores::RiskHistoryStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Background writer for risk-history records.
///
/// `submit` never blocks and never fails; append errors are logged and
/// dropped on the writer task.
pub struct HistoryWriter {
    tx: mpsc::UnboundedSender<RiskHistoryRecord>,
    handle: JoinHandle<()>,
}

impl HistoryWriter {
    /// Must be called inside a tokio runtime.
    pub fn spawn(store: Arc<dyn RiskHistoryStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<RiskHistoryRecord>();

        let handle = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                match store.append(&record) {
                    Ok(()) => debug!(crop = %record.crop_instance_id, "Risk history recorded"),
                    Err(e) => warn!(
                        crop = %record.crop_instance_id,
                        "Failed to record risk history: {}", e
                    ),
                }
            }
        });

        Self { tx, handle }
    }

    pub fn submit(&self, record: RiskHistoryRecord) {
        if self.tx.send(record).is_err() {
            warn!("Risk history writer has stopped; record dropped");
        }
    }

    /// Close the queue and wait for pending records to be written.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.handle.await {
            warn!("Risk history writer ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::error::{HarvestWiseError, Result};
    use crate::models::{RiskLevel, StorageType};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(id: &str) -> RiskHistoryRecord {
        RiskHistoryRecord {
            id: None,
            crop_instance_id: id.into(),
            crop_name: "Tomato".into(),
            risk_percentage: 65,
            risk_level: RiskLevel::High,
            storage_type: StorageType::Cold,
            temperature_c: 35.0,
            humidity_percent: 80.0,
            recorded_at: Utc::now(),
        }
    }

    #[derive(Default)]
    struct BrokenStore {
        attempts: AtomicUsize,
    }

    impl RiskHistoryStore for BrokenStore {
        fn append(&self, _record: &RiskHistoryRecord) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(HarvestWiseError::Storage("disk full".into()))
        }

        fn recent(&self, _limit: usize) -> Result<Vec<RiskHistoryRecord>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn shutdown_drains_queue() {
        let db = Database::open_in_memory().unwrap();
        let writer = HistoryWriter::spawn(Arc::new(db.clone()));

        for i in 0..10 {
            writer.submit(record(&format!("crop-{i}")));
        }
        writer.shutdown().await;

        assert_eq!(db.recent(50).unwrap().len(), 10);
    }

    #[tokio::test]
    async fn append_failures_do_not_stop_the_writer() {
        let store = Arc::new(BrokenStore::default());
        let writer = HistoryWriter::spawn(store.clone());
        writer.submit(record("crop-1"));
        writer.submit(record("crop-2"));
        writer.shutdown().await;

        // Both records were attempted after the first failure
        assert_eq!(store.attempts.load(Ordering::SeqCst), 2);
    }
}
