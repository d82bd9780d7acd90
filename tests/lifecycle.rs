//! End-to-end broadcast and persistence flows against the library API
//!
//! A live broker is replaced by a scripted [`Publisher`]; the broadcast
//! pipeline, stats bookkeeping, and JSON persistence run unmodified.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use mqtt_broadcaster::broadcast::{
    BroadcastDispatcher, BroadcastEvent, BroadcastRequest, Publisher,
};
use mqtt_broadcaster::mqtt::MqttError;
use mqtt_broadcaster::stats::{ChannelStatsStore, STATS_FILE};

/// Succeeds until `fail_after` publishes have gone through, then reports
/// the connection as lost
struct FlakyBroker {
    sent: AtomicU64,
    fail_after: u64,
}

impl FlakyBroker {
    fn new(fail_after: u64) -> Arc<Self> {
        Arc::new(Self {
            sent: AtomicU64::new(0),
            fail_after,
        })
    }
}

impl Publisher for FlakyBroker {
    fn publish(&self, _topic: &str, _payload: &[u8]) -> Result<(), MqttError> {
        let n = self.sent.fetch_add(1, Ordering::SeqCst);
        if n >= self.fail_after {
            return Err(MqttError::NotConnected);
        }
        Ok(())
    }
}

async fn wait_for_completion(rx: &mut mpsc::Receiver<BroadcastEvent>) -> (u64, u64) {
    loop {
        let event = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("broadcast did not complete in time")
            .expect("event channel closed");
        if let BroadcastEvent::Complete {
            total_sent,
            failed_sends,
        } = event
        {
            return (total_sent, failed_sends);
        }
    }
}

fn request(count: u32, targets: &[&str], workers: usize) -> BroadcastRequest {
    BroadcastRequest {
        message: "load test".to_string(),
        count,
        targets: targets.iter().map(|t| t.to_string()).collect(),
        delay: Duration::ZERO,
        workers,
        append_counter: false,
    }
}

#[tokio::test]
async fn broadcast_persists_sent_counters() {
    let dir = tempfile::tempdir().unwrap();
    let stats_path = dir.path().join(STATS_FILE);
    let stats = Arc::new(ChannelStatsStore::new(&stats_path));

    let broker = FlakyBroker::new(u64::MAX);
    let (tx, mut rx) = mpsc::channel(1024);
    let dispatcher = BroadcastDispatcher::new(broker, stats.clone(), tx);

    dispatcher.start(request(5, &["load/a", "load/b"], 2)).unwrap();
    let (total_sent, failed_sends) = wait_for_completion(&mut rx).await;

    assert_eq!(total_sent, 10);
    assert_eq!(failed_sends, 0);

    // Next-startup view: the completion path saved the counters.
    let reloaded = ChannelStatsStore::load(&stats_path);
    let totals = reloaded.totals();
    assert_eq!(totals.sent, 10);
    assert_eq!(totals.topics, 2);
    let snapshot = reloaded.snapshot();
    assert_eq!(snapshot["load/a"].sent, 5);
    assert_eq!(snapshot["load/b"].sent, 5);
}

#[tokio::test]
async fn connection_loss_mid_broadcast_is_contained() {
    let dir = tempfile::tempdir().unwrap();
    let stats = Arc::new(ChannelStatsStore::new(dir.path().join(STATS_FILE)));

    // Broker drops out after 7 successful sends.
    let broker = FlakyBroker::new(7);
    let (tx, mut rx) = mpsc::channel(1024);
    let dispatcher = BroadcastDispatcher::new(broker, stats.clone(), tx);

    dispatcher.start(request(10, &["load/a", "load/b"], 3)).unwrap();
    let (total_sent, failed_sends) = wait_for_completion(&mut rx).await;

    // Every job accounted for exactly once; the failures never aborted the
    // batch.
    assert_eq!(total_sent, 7);
    assert_eq!(failed_sends, 13);
    assert_eq!(total_sent + failed_sends, 20);
    assert_eq!(stats.totals().sent, 7);
}

#[tokio::test]
async fn stats_survive_multiple_runs() {
    let dir = tempfile::tempdir().unwrap();
    let stats_path = dir.path().join(STATS_FILE);

    {
        let stats = Arc::new(ChannelStatsStore::new(&stats_path));
        stats.record_received("sensors/temp");
        stats.record_sent("sensors/temp");
        stats.save();
    }

    // Second "run" piles on top of the loaded counters.
    let stats = Arc::new(ChannelStatsStore::load(&stats_path));
    let broker = FlakyBroker::new(u64::MAX);
    let (tx, mut rx) = mpsc::channel(256);
    let dispatcher = BroadcastDispatcher::new(broker, stats.clone(), tx);
    dispatcher.start(request(3, &["sensors/temp"], 1)).unwrap();
    wait_for_completion(&mut rx).await;

    let reloaded = ChannelStatsStore::load(&stats_path);
    let snapshot = reloaded.snapshot();
    assert_eq!(snapshot["sensors/temp"].sent, 4);
    assert_eq!(snapshot["sensors/temp"].received, 1);
}
