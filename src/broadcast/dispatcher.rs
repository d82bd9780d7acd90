//! Concurrent bulk-publish worker pool
//!
//! One broadcast publishes `count` copies of a message template to every
//! target topic. The job queue is drained by a bounded pool of workers;
//! each job is consumed by exactly one worker, a failed publish is counted
//! and reported but never aborts the batch, and every completed job
//! produces a progress report. A [`CancellationToken`] checked between
//! jobs lets the operator stop a large broadcast mid-flight.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::mqtt::{ConnectionSession, MqttError};
use crate::stats::ChannelStatsStore;

/// Publish capability the workers need; implemented by the live session
/// and by mocks in tests
pub trait Publisher: Send + Sync {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), MqttError>;
}

impl Publisher for ConnectionSession {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), MqttError> {
        ConnectionSession::publish(self, topic, payload, None, None)
    }
}

/// One broadcast operation as requested by the UI
#[derive(Debug, Clone)]
pub struct BroadcastRequest {
    pub message: String,
    /// Repeat rounds, >= 1
    pub count: u32,
    /// Deduplicated by the caller, non-empty
    pub targets: Vec<String>,
    /// Applied by each worker after every send; throttles per worker, not
    /// globally
    pub delay: Duration,
    pub workers: usize,
    /// Suffix each payload with " (round/count)"
    pub append_counter: bool,
}

/// One (topic, payload) unit of work, consumed by exactly one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastJob {
    pub topic: String,
    pub payload: String,
}

#[derive(Debug, Default)]
struct BroadcastStats {
    total_sent: u64,
    failed_sends: u64,
    total_jobs: u64,
}

/// Progress and completion reports for one broadcast
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastEvent {
    /// Fraction of jobs sent so far (total_sent / total_jobs)
    Progress(f32),
    JobFailed {
        topic: String,
        error: String,
    },
    /// Fired exactly once, after every worker has exited
    Complete {
        total_sent: u64,
        failed_sends: u64,
    },
}

/// Running broadcast; dropping it does not stop the workers
pub struct BroadcastHandle {
    cancel: CancellationToken,
    supervisor: tokio::task::JoinHandle<()>,
}

impl BroadcastHandle {
    /// Workers stop after their current job; completion still fires
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.supervisor.is_finished()
    }
}

pub struct BroadcastDispatcher {
    rt: Handle,
    publisher: Arc<dyn Publisher>,
    stats: Arc<ChannelStatsStore>,
    events: mpsc::Sender<BroadcastEvent>,
}

impl BroadcastDispatcher {
    /// Must be called from within a tokio runtime
    pub fn new(
        publisher: Arc<dyn Publisher>,
        stats: Arc<ChannelStatsStore>,
        events: mpsc::Sender<BroadcastEvent>,
    ) -> Self {
        Self {
            rt: Handle::current(),
            publisher,
            stats,
            events,
        }
    }

    /// Builds the job queue and launches the worker pool
    pub fn start(&self, request: BroadcastRequest) -> Result<BroadcastHandle, MqttError> {
        if request.count == 0 {
            return Err(MqttError::Config("broadcast count must be >= 1".to_string()));
        }
        if request.targets.is_empty() {
            return Err(MqttError::Config("no broadcast targets".to_string()));
        }
        if request.workers == 0 {
            return Err(MqttError::Config("worker count must be >= 1".to_string()));
        }

        let jobs = build_jobs(&request);
        let total_jobs = jobs.len() as u64;
        let workers = request.workers.min(jobs.len());
        info!(total_jobs, workers, "starting broadcast");

        let queue = Arc::new(Mutex::new(jobs));
        let stats = Arc::new(Mutex::new(BroadcastStats {
            total_jobs,
            ..Default::default()
        }));
        let cancel = CancellationToken::new();

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            handles.push(self.rt.spawn(worker_loop(
                id,
                queue.clone(),
                self.publisher.clone(),
                stats.clone(),
                self.stats.clone(),
                self.events.clone(),
                request.delay,
                cancel.clone(),
            )));
        }

        let events = self.events.clone();
        let channel_stats = self.stats.clone();
        let supervisor = self.rt.spawn(async move {
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!("broadcast worker panicked: {e}");
                }
            }
            let (total_sent, failed_sends) = {
                let stats = lock(&stats);
                (stats.total_sent, stats.failed_sends)
            };
            info!(total_sent, failed_sends, "broadcast complete");
            channel_stats.save();
            if events
                .send(BroadcastEvent::Complete {
                    total_sent,
                    failed_sends,
                })
                .await
                .is_err()
            {
                warn!("broadcast completion receiver dropped");
            }
        });

        Ok(BroadcastHandle { cancel, supervisor })
    }
}

/// Each target topic appears once per repeat round
fn build_jobs(request: &BroadcastRequest) -> VecDeque<BroadcastJob> {
    let mut jobs = VecDeque::with_capacity(request.count as usize * request.targets.len());
    for round in 1..=request.count {
        let payload = if request.append_counter {
            format!("{} ({round}/{})", request.message, request.count)
        } else {
            request.message.clone()
        };
        for topic in &request.targets {
            jobs.push_back(BroadcastJob {
                topic: topic.clone(),
                payload: payload.clone(),
            });
        }
    }
    jobs
}

#[allow(clippy::too_many_arguments)]
async fn worker_loop(
    id: usize,
    queue: Arc<Mutex<VecDeque<BroadcastJob>>>,
    publisher: Arc<dyn Publisher>,
    stats: Arc<Mutex<BroadcastStats>>,
    channel_stats: Arc<ChannelStatsStore>,
    events: mpsc::Sender<BroadcastEvent>,
    delay: Duration,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            debug!(worker = id, "broadcast cancelled");
            break;
        }
        // Non-blocking dequeue: an empty queue means no more work, since
        // all jobs are enqueued before the workers start.
        let Some(job) = lock(&queue).pop_front() else {
            break;
        };

        match publisher.publish(&job.topic, job.payload.as_bytes()) {
            Ok(()) => {
                channel_stats.record_sent(&job.topic);
                lock(&stats).total_sent += 1;
            }
            Err(e) => {
                lock(&stats).failed_sends += 1;
                warn!(topic = %job.topic, "broadcast publish failed: {e}");
                if events
                    .try_send(BroadcastEvent::JobFailed {
                        topic: job.topic.clone(),
                        error: e.to_string(),
                    })
                    .is_err()
                {
                    debug!("dropped job-failure report");
                }
            }
        }

        let progress = {
            let stats = lock(&stats);
            stats.total_sent as f32 / stats.total_jobs as f32
        };
        if events.try_send(BroadcastEvent::Progress(progress)).is_err() {
            debug!("dropped progress report");
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
