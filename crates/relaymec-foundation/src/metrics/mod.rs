//! Decision recording over a bounded channel.
//!
//! [`ChannelRecorder`] is the [`DecisionSink`] handed to the optimizer: it
//! never blocks, and a record that does not fit in the channel is dropped
//! and counted. [`DecisionCollector`] drains the channel on a tokio task into
//! an in-memory store.

mod stats;

pub use stats::SummaryStatistics;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use relaymec_kernel::{DecisionRecord, DecisionSink};
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;

// ============================================================================
// ChannelRecorder
// ============================================================================

/// Sends records over a bounded `tokio::sync::mpsc` channel.
#[derive(Debug, Clone)]
pub struct ChannelRecorder {
    tx: mpsc::Sender<DecisionRecord>,
    dropped: Arc<AtomicU64>,
}

impl ChannelRecorder {
    /// Create a recorder with room for `buffer` records in flight.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<DecisionRecord>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let recorder = Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (recorder, rx)
    }

    /// Records lost to a full or closed channel, across all clones.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl DecisionSink for ChannelRecorder {
    fn record(&self, record: DecisionRecord) {
        if self.tx.try_send(record).is_err() {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::trace!(dropped, "decision record dropped");
        }
    }
}

// ============================================================================
// DecisionCollector
// ============================================================================

/// Background task accumulating everything a [`ChannelRecorder`] sends.
#[derive(Debug)]
pub struct DecisionCollector {
    store: Arc<RwLock<Vec<DecisionRecord>>>,
    handle: JoinHandle<()>,
}

impl DecisionCollector {
    /// Start draining `rx`. Must be called inside a tokio runtime.
    pub fn spawn(mut rx: mpsc::Receiver<DecisionRecord>) -> Self {
        let store = Arc::new(RwLock::new(Vec::new()));
        let sink = Arc::clone(&store);
        let handle = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                sink.write().await.push(record);
            }
        });
        Self { store, handle }
    }

    /// Records collected so far.
    pub async fn snapshot(&self) -> Vec<DecisionRecord> {
        self.store.read().await.clone()
    }

    /// Wait until every recorder is gone and the channel is drained.
    pub async fn finish(self) -> Vec<DecisionRecord> {
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "decision collector stopped abnormally");
        }
        let mut store = self.store.write().await;
        std::mem::take(&mut *store)
    }
}

/// Recorder and a running collector wired to each other.
pub fn recording_channel(buffer: usize) -> (ChannelRecorder, DecisionCollector) {
    let (recorder, rx) = ChannelRecorder::new(buffer);
    (recorder, DecisionCollector::spawn(rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaymec_kernel::OffloadingDecision;

    fn record(task: &str) -> DecisionRecord {
        DecisionRecord::from_decision(7, task, &OffloadingDecision::null())
    }

    #[tokio::test]
    async fn collector_gathers_everything_sent() {
        let (recorder, collector) = recording_channel(16);
        recorder.record(record("a"));
        recorder.record(record("b"));
        drop(recorder);

        let records = collector.finish().await;
        let ids: Vec<&str> = records.iter().map(|r| r.task_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn full_channel_drops_and_counts() {
        let (recorder, mut rx) = ChannelRecorder::new(1);
        recorder.record(record("kept"));
        recorder.record(record("lost"));
        recorder.clone().record(record("lost too"));

        assert_eq!(recorder.dropped(), 2);
        assert_eq!(rx.try_recv().unwrap().task_id, "kept");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_channel_drops_silently() {
        let (recorder, rx) = ChannelRecorder::new(4);
        drop(rx);
        recorder.record(record("x"));
        assert_eq!(recorder.dropped(), 1);
    }

    #[tokio::test]
    async fn snapshot_sees_records_in_flight() {
        let (recorder, collector) = recording_channel(8);
        recorder.record(record("a"));
        for _ in 0..100 {
            if !collector.snapshot().await.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(collector.snapshot().await.len(), 1);
        drop(recorder);
        assert_eq!(collector.finish().await.len(), 1);
    }
}
