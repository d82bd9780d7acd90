//! Connection lifecycle state machine
//!
//! [`ConnectionSession`] owns exactly one logical broker connection: it
//! validates the config, builds a fresh rumqttc client per attempt, drives
//! the client's event loop from a background task, arms a single-shot
//! connect watchdog, and replays the subscription registry after a
//! successful (re)connect.
//!
//! All results cross back to the UI collaborator as [`SessionEvent`]s on an
//! mpsc channel; the session never touches render state. Each connect
//! attempt carries a generation number, so events from a torn-down attempt
//! (a late ConnAck after a timeout, a stale watchdog) are ignored and the
//! connection result fires at most once per attempt.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Packet};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::ConnectionConfig;
use super::error::MqttError;
use super::link::{build_mqtt_options, ConnectEvent, PubSubLink, RumqttcLink};
use super::subscriptions::SubscriptionRegistry;
use crate::stats::ChannelStatsStore;

/// Watchdog duration for one connect attempt
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Event queue depth of the rumqttc client
const CLIENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// What the session reports to its collaborator
///
/// The collaborator decides how to marshal these onto its own execution
/// context; the session only queues them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Terminal result of one connect attempt, fired at most once
    ConnectionResult {
        success: bool,
        error: Option<String>,
    },
    /// Incoming publish, payload forwarded verbatim
    Message { topic: String, payload: Vec<u8> },
    /// reason_code 0 is a clean disconnect, nonzero unexpected
    Disconnected { reason_code: u8 },
}

struct SessionInner {
    state: ConnectionState,
    config: Option<ConnectionConfig>,
    link: Option<Arc<dyn PubSubLink>>,
    subscriptions: SubscriptionRegistry,
    /// Bumped on every connect; stale events are dropped by comparing it
    generation: u64,
    /// True once the current attempt's connection result went out
    result_reported: bool,
    cancel: Option<CancellationToken>,
}

struct Shared {
    inner: Mutex<SessionInner>,
    events: mpsc::Sender<SessionEvent>,
    stats: Arc<ChannelStatsStore>,
    rt: Handle,
}

/// Handle to one broker connection, cheap to clone
#[derive(Clone)]
pub struct ConnectionSession {
    shared: Arc<Shared>,
}

impl ConnectionSession {
    /// Must be called from within a tokio runtime; the handle is captured
    /// here so later calls may come from the UI thread.
    pub fn new(events: mpsc::Sender<SessionEvent>, stats: Arc<ChannelStatsStore>) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(SessionInner {
                    state: ConnectionState::Disconnected,
                    config: None,
                    link: None,
                    subscriptions: SubscriptionRegistry::new(),
                    generation: 0,
                    result_reported: true,
                    cancel: None,
                }),
                events,
                stats,
                rt: Handle::current(),
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.lock().state == ConnectionState::Connected
    }

    /// Seeds the registry with previously saved entries
    ///
    /// Callable while disconnected; the entries are replayed on the next
    /// successful connect like any other registry content.
    pub fn restore_subscriptions<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, u8)>,
    {
        let mut inner = self.lock();
        for (topic, qos) in entries {
            inner.subscriptions.add(&topic, qos);
        }
    }

    /// Snapshot of the registry for display
    pub fn subscriptions(&self) -> Vec<(String, u8)> {
        self.lock()
            .subscriptions
            .iter()
            .map(|(t, q)| (t.to_string(), q))
            .collect()
    }

    /// Starts one connect attempt and returns immediately
    ///
    /// The result arrives later as [`SessionEvent::ConnectionResult`]. A
    /// config or TLS-material problem is returned synchronously; the TLS
    /// case additionally reports a failure event so the collaborator sees
    /// every failed attempt through the same channel.
    pub fn connect(&self, config: ConnectionConfig) -> Result<(), MqttError> {
        config.validate()?;

        // A fresh connect always tears the previous attempt down first.
        self.teardown(false);

        let options = match build_mqtt_options(&config) {
            Ok(options) => options,
            Err(e) => {
                self.emit(SessionEvent::ConnectionResult {
                    success: false,
                    error: Some(e.to_string()),
                });
                return Err(e);
            }
        };

        info!(host = %config.host, port = config.port, "connecting to broker");

        let (client, event_loop) = AsyncClient::new(options, CLIENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.result_reported = false;
            inner.state = ConnectionState::Connecting;
            inner.link = Some(Arc::new(RumqttcLink::new(client)));
            inner.config = Some(config);
            inner.cancel = Some(cancel.clone());
            inner.generation
        };

        self.shared.rt.spawn(drive_event_loop(
            self.shared.clone(),
            generation,
            event_loop,
            cancel.clone(),
        ));
        self.shared
            .rt
            .spawn(connect_watchdog(self.shared.clone(), generation, cancel));

        Ok(())
    }

    /// Idempotent; a second call in a row is a no-op and emits nothing
    pub fn disconnect(&self) {
        if self.teardown(true) {
            info!("disconnected from broker");
            self.emit(SessionEvent::Disconnected { reason_code: 0 });
        }
    }

    /// Non-blocking handoff to the client; per-call qos/retain fall back to
    /// the connect config's defaults
    pub fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: Option<u8>,
        retain: Option<bool>,
    ) -> Result<(), MqttError> {
        let (link, qos, retain) = {
            let inner = self.lock();
            if inner.state != ConnectionState::Connected {
                return Err(MqttError::NotConnected);
            }
            let link = inner.link.clone().ok_or(MqttError::NotConnected)?;
            let config = inner.config.as_ref();
            (
                link,
                qos.unwrap_or_else(|| config.map(|c| c.qos).unwrap_or(0)),
                retain.unwrap_or_else(|| config.map(|c| c.retain).unwrap_or(false)),
            )
        };
        link.publish(topic, payload, qos, retain)
            .map_err(|e| MqttError::Connection(e.to_string()))
    }

    /// Subscribes and records the topic for reconnect replay
    pub fn subscribe(&self, topic: &str, qos: u8) -> Result<(), MqttError> {
        let link = self.connected_link()?;
        link.subscribe(topic, qos)
            .map_err(|e| MqttError::Connection(e.to_string()))?;
        self.lock().subscriptions.add(topic, qos);
        Ok(())
    }

    pub fn unsubscribe(&self, topic: &str) -> Result<(), MqttError> {
        let link = self.connected_link()?;
        link.unsubscribe(topic)
            .map_err(|e| MqttError::Connection(e.to_string()))?;
        self.lock().subscriptions.remove(topic);
        Ok(())
    }

    fn connected_link(&self) -> Result<Arc<dyn PubSubLink>, MqttError> {
        let inner = self.lock();
        if inner.state != ConnectionState::Connected {
            return Err(MqttError::NotConnected);
        }
        inner.link.clone().ok_or(MqttError::NotConnected)
    }

    /// Releases the client and cancels any in-flight attempt. Returns false
    /// when there was nothing to tear down.
    fn teardown(&self, clear_subscriptions: bool) -> bool {
        let (link, cancel) = {
            let mut inner = self.lock();
            if inner.state == ConnectionState::Disconnected && inner.link.is_none() {
                return false;
            }
            inner.state = ConnectionState::Disconnecting;
            // Any pending attempt is terminal now; its watchdog and driver
            // will see result_reported and stay quiet.
            inner.result_reported = true;
            if clear_subscriptions {
                inner.subscriptions.clear();
            }
            let link = inner.link.take();
            let cancel = inner.cancel.take();
            inner.state = ConnectionState::Disconnected;
            (link, cancel)
        };
        if let Some(cancel) = cancel {
            cancel.cancel();
        }
        if let Some(link) = link {
            link.shutdown();
        }
        true
    }

    /// ConnAck (or dial failure) for attempt `generation`
    pub(crate) fn handle_connect_event(&self, generation: u64, event: ConnectEvent) {
        let replay = {
            let mut inner = self.lock();
            if inner.generation != generation || inner.result_reported {
                debug!(generation, "ignoring stale connect event");
                return;
            }
            inner.result_reported = true;
            if event.success {
                inner.state = ConnectionState::Connected;
                // The config's primary topic joins the registry so it is
                // replayed on later reconnects as well.
                if let Some(config) = &inner.config {
                    let (topic, qos) = (config.topic.clone(), config.qos);
                    inner.subscriptions.add(&topic, qos);
                }
                let link = inner.link.clone();
                let subs: Vec<(String, u8)> = inner
                    .subscriptions
                    .iter()
                    .map(|(t, q)| (t.to_string(), q))
                    .collect();
                link.map(|link| (link, subs))
            } else {
                inner.state = ConnectionState::Disconnected;
                let link = inner.link.take();
                let cancel = inner.cancel.take();
                if let Some(cancel) = cancel {
                    cancel.cancel();
                }
                if let Some(link) = link {
                    link.shutdown();
                }
                None
            }
        };

        if event.success {
            if let Some((link, subs)) = replay {
                for (topic, qos) in subs {
                    if let Err(e) = link.subscribe(&topic, qos) {
                        warn!(topic, "subscription replay failed: {e}");
                    }
                }
            }
            info!("connected to broker");
            self.emit(SessionEvent::ConnectionResult {
                success: true,
                error: None,
            });
        } else {
            let message = event
                .message
                .unwrap_or_else(|| format!("connection refused (code {})", event.code));
            error!(code = event.code, "broker connection failed: {message}");
            self.emit(SessionEvent::ConnectionResult {
                success: false,
                error: Some(message),
            });
        }
    }

    /// Incoming publish for attempt `generation`
    pub(crate) fn handle_message(&self, generation: u64, topic: &str, payload: Vec<u8>) {
        {
            let inner = self.lock();
            if inner.generation != generation || inner.state != ConnectionState::Connected {
                return;
            }
        }
        self.shared.stats.record_received(topic);
        self.emit(SessionEvent::Message {
            topic: topic.to_string(),
            payload,
        });
    }

    /// Connection loss for attempt `generation`; the registry is kept so a
    /// later connect can replay it
    pub(crate) fn handle_disconnect(&self, generation: u64, reason_code: u8) {
        let reconnect = {
            let mut inner = self.lock();
            if inner.generation != generation {
                return;
            }
            let was_connected = inner.state == ConnectionState::Connected;
            inner.state = ConnectionState::Disconnected;
            inner.result_reported = true;
            let link = inner.link.take();
            let cancel = inner.cancel.take();
            if let Some(cancel) = cancel {
                cancel.cancel();
            }
            if let Some(link) = link {
                link.shutdown();
            }
            if was_connected && reason_code != 0 {
                inner
                    .config
                    .as_ref()
                    .filter(|c| c.auto_reconnect)
                    .cloned()
            } else {
                None
            }
        };

        warn!(reason_code, "broker connection lost");
        self.emit(SessionEvent::Disconnected { reason_code });

        if let Some(config) = reconnect {
            let delay = config.reconnect_delay;
            let session = self.clone();
            info!(delay_secs = delay.as_secs(), "scheduling reconnect");
            self.shared.rt.spawn(async move {
                tokio::time::sleep(delay).await;
                if session.state() == ConnectionState::Disconnected {
                    if let Err(e) = session.connect(config) {
                        error!("automatic reconnect failed: {e}");
                    }
                }
            });
        }
    }

    /// Watchdog expiry for attempt `generation`
    pub(crate) fn handle_timeout(&self, generation: u64) {
        {
            let mut inner = self.lock();
            if inner.generation != generation
                || inner.result_reported
                || inner.state != ConnectionState::Connecting
            {
                return;
            }
            inner.result_reported = true;
            inner.state = ConnectionState::Disconnected;
            let link = inner.link.take();
            let cancel = inner.cancel.take();
            if let Some(cancel) = cancel {
                cancel.cancel();
            }
            if let Some(link) = link {
                link.shutdown();
            }
        }
        error!("connect attempt timed out");
        self.emit(SessionEvent::ConnectionResult {
            success: false,
            error: Some(MqttError::Timeout.to_string()),
        });
    }

    fn attempt_state(&self, generation: u64) -> Option<ConnectionState> {
        let inner = self.lock();
        (inner.generation == generation).then_some(inner.state)
    }

    fn emit(&self, event: SessionEvent) {
        if let Err(e) = self.shared.events.try_send(event) {
            warn!("dropping session event: {e}");
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        // Recover from a poisoned lock; the state is plain-old-data.
        self.shared
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    pub(crate) fn begin_test_attempt(
        &self,
        link: Arc<dyn PubSubLink>,
        config: ConnectionConfig,
    ) -> u64 {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.result_reported = false;
        inner.state = ConnectionState::Connecting;
        inner.link = Some(link);
        inner.config = Some(config);
        inner.cancel = Some(CancellationToken::new());
        inner.generation
    }
}

/// Polls the rumqttc event loop and feeds normalized events to the session
///
/// Exits on cancellation, on a failed attempt, or on connection loss; the
/// session decides whether a new attempt (reconnect) gets a fresh driver.
async fn drive_event_loop(
    shared: Arc<Shared>,
    generation: u64,
    mut event_loop: EventLoop,
    cancel: CancellationToken,
) {
    let session = ConnectionSession { shared };
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(generation, "event loop driver stopped");
                break;
            }
            polled = event_loop.poll() => match polled {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    let event = ConnectEvent::from_connack(ack.code);
                    let accepted = event.success;
                    session.handle_connect_event(generation, event);
                    if !accepted {
                        break;
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    session.handle_message(generation, &publish.topic, publish.payload.to_vec());
                }
                Ok(_) => {}
                Err(e) => {
                    match session.attempt_state(generation) {
                        Some(ConnectionState::Connecting) => {
                            session.handle_connect_event(
                                generation,
                                ConnectEvent::failure(255, e.to_string()),
                            );
                        }
                        Some(ConnectionState::Connected) => {
                            debug!("event loop error: {e}");
                            session.handle_disconnect(generation, 1);
                        }
                        _ => {}
                    }
                    break;
                }
            }
        }
    }
}

/// Single-shot timer forcing a terminal failure if no ConnAck arrives
async fn connect_watchdog(shared: Arc<Shared>, generation: u64, cancel: CancellationToken) {
    tokio::select! {
        _ = cancel.cancelled() => {}
        _ = tokio::time::sleep(CONNECT_TIMEOUT) => {
            ConnectionSession { shared }.handle_timeout(generation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt::link::LinkError;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct MockLink {
        fail_publishes: AtomicBool,
        publishes: Mutex<Vec<(String, Vec<u8>, u8, bool)>>,
        subscribes: Mutex<Vec<(String, u8)>>,
        unsubscribes: Mutex<Vec<String>>,
    }

    impl PubSubLink for MockLink {
        fn publish(
            &self,
            topic: &str,
            payload: &[u8],
            qos: u8,
            retain: bool,
        ) -> Result<(), LinkError> {
            if self.fail_publishes.load(Ordering::SeqCst) {
                return Err(LinkError("queue closed".to_string()));
            }
            self.publishes.lock().unwrap().push((
                topic.to_string(),
                payload.to_vec(),
                qos,
                retain,
            ));
            Ok(())
        }

        fn subscribe(&self, topic: &str, qos: u8) -> Result<(), LinkError> {
            self.subscribes.lock().unwrap().push((topic.to_string(), qos));
            Ok(())
        }

        fn unsubscribe(&self, topic: &str) -> Result<(), LinkError> {
            self.unsubscribes.lock().unwrap().push(topic.to_string());
            Ok(())
        }

        fn shutdown(&self) {}
    }

    fn test_config() -> ConnectionConfig {
        ConnectionConfig {
            host: "broker.example.com".to_string(),
            port: 1883,
            topic: "test/#".to_string(),
            ..Default::default()
        }
    }

    fn test_session() -> (
        ConnectionSession,
        mpsc::Receiver<SessionEvent>,
        Arc<ChannelStatsStore>,
    ) {
        let (tx, rx) = mpsc::channel(64);
        let stats = Arc::new(ChannelStatsStore::new("channel_stats.json"));
        (ConnectionSession::new(tx, stats.clone()), rx, stats)
    }

    fn drain(rx: &mut mpsc::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    #[tokio::test]
    async fn successful_connack_yields_one_success_result() {
        let (session, mut rx, _) = test_session();
        let link = Arc::new(MockLink::default());
        let generation = session.begin_test_attempt(link.clone(), test_config());

        session.handle_connect_event(generation, ConnectEvent::success());
        // A duplicate ConnAck for the same attempt must stay silent.
        session.handle_connect_event(generation, ConnectEvent::success());

        assert!(session.is_connected());
        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![SessionEvent::ConnectionResult {
                success: true,
                error: None
            }]
        );
    }

    #[tokio::test]
    async fn connack_success_replays_primary_topic() {
        let (session, _rx, _) = test_session();
        let link = Arc::new(MockLink::default());
        let generation = session.begin_test_attempt(link.clone(), test_config());

        session.handle_connect_event(generation, ConnectEvent::success());

        let subs = link.subscribes.lock().unwrap();
        assert!(subs.iter().any(|(t, _)| t == "test/#"));
    }

    #[tokio::test]
    async fn restored_subscriptions_replay_on_connect() {
        let (session, _rx, _) = test_session();
        let link = Arc::new(MockLink::default());

        // Saved in a previous run, restored before any connect.
        session.restore_subscriptions(vec![
            ("sensors/#".to_string(), 1),
            ("alerts/fire".to_string(), 2),
        ]);
        assert_eq!(session.subscriptions().len(), 2);

        let generation = session.begin_test_attempt(link.clone(), test_config());
        session.handle_connect_event(generation, ConnectEvent::success());

        let subs = link.subscribes.lock().unwrap();
        assert!(subs.contains(&("sensors/#".to_string(), 1)));
        assert!(subs.contains(&("alerts/fire".to_string(), 2)));
    }

    #[tokio::test]
    async fn refused_connack_yields_one_failure_result() {
        let (session, mut rx, _) = test_session();
        let link = Arc::new(MockLink::default());
        let generation = session.begin_test_attempt(link, test_config());

        session.handle_connect_event(generation, ConnectEvent::failure(5, "not authorized"));

        assert!(!session.is_connected());
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            SessionEvent::ConnectionResult {
                success: false,
                error: Some(msg)
            } if msg == "not authorized"
        ));
    }

    #[tokio::test]
    async fn publish_while_disconnected_fails_without_client_call() {
        let (session, _rx, _) = test_session();
        let link = Arc::new(MockLink::default());
        session.begin_test_attempt(link.clone(), test_config());
        // Still Connecting, not Connected.
        let result = session.publish("test/x", b"hi", None, None);
        assert!(matches!(result, Err(MqttError::NotConnected)));
        assert!(link.publishes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn timeout_suppresses_late_connack() {
        let (session, mut rx, _) = test_session();
        let link = Arc::new(MockLink::default());
        let generation = session.begin_test_attempt(link, test_config());

        session.handle_timeout(generation);
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            SessionEvent::ConnectionResult {
                success: false,
                error: Some(msg)
            } if msg.contains("timeout")
        ));

        // Late ConnAck for the timed-out attempt: no second result, still
        // disconnected.
        session.handle_connect_event(generation, ConnectEvent::success());
        assert!(!session.is_connected());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn watchdog_stays_quiet_once_connected() {
        let (session, mut rx, _) = test_session();
        let link = Arc::new(MockLink::default());
        let generation = session.begin_test_attempt(link, test_config());

        session.handle_connect_event(generation, ConnectEvent::success());
        drain(&mut rx);

        session.handle_timeout(generation);
        assert!(session.is_connected());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let (session, mut rx, _) = test_session();
        let link = Arc::new(MockLink::default());
        let generation = session.begin_test_attempt(link, test_config());
        session.handle_connect_event(generation, ConnectEvent::success());
        drain(&mut rx);

        session.disconnect();
        session.disconnect();

        let events = drain(&mut rx);
        assert_eq!(events, vec![SessionEvent::Disconnected { reason_code: 0 }]);
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn message_is_forwarded_verbatim_and_counted() {
        let (session, mut rx, stats) = test_session();
        let link = Arc::new(MockLink::default());
        let generation = session.begin_test_attempt(link, test_config());
        session.handle_connect_event(generation, ConnectEvent::success());
        drain(&mut rx);

        session.handle_message(generation, "test/x", b"hi".to_vec());

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![SessionEvent::Message {
                topic: "test/x".to_string(),
                payload: b"hi".to_vec()
            }]
        );
        assert_eq!(stats.totals().received, 1);
    }

    #[tokio::test]
    async fn resubscribing_overwrites_qos() {
        let (session, _rx, _) = test_session();
        let link = Arc::new(MockLink::default());
        let generation = session.begin_test_attempt(link, test_config());
        session.handle_connect_event(generation, ConnectEvent::success());

        session.subscribe("sensors/#", 0).unwrap();
        session.subscribe("sensors/#", 2).unwrap();

        let subs = session.subscriptions();
        let entry = subs.iter().find(|(t, _)| t == "sensors/#").unwrap();
        assert_eq!(entry.1, 2);
    }

    #[tokio::test]
    async fn unexpected_disconnect_keeps_registry_for_replay() {
        let (session, mut rx, _) = test_session();
        let link = Arc::new(MockLink::default());
        let generation = session.begin_test_attempt(link, test_config());
        session.handle_connect_event(generation, ConnectEvent::success());
        session.subscribe("extra/topic", 1).unwrap();
        drain(&mut rx);

        session.handle_disconnect(generation, 1);

        assert_eq!(
            drain(&mut rx),
            vec![SessionEvent::Disconnected { reason_code: 1 }]
        );
        assert!(!session.is_connected());
        let subs = session.subscriptions();
        assert!(subs.iter().any(|(t, _)| t == "extra/topic"));
        assert!(subs.iter().any(|(t, _)| t == "test/#"));
    }

    #[tokio::test]
    async fn publish_failure_converts_link_error() {
        let (session, _rx, _) = test_session();
        let link = Arc::new(MockLink::default());
        let generation = session.begin_test_attempt(link.clone(), test_config());
        session.handle_connect_event(generation, ConnectEvent::success());

        link.fail_publishes.store(true, Ordering::SeqCst);
        let result = session.publish("test/x", b"hi", None, None);
        assert!(matches!(result, Err(MqttError::Connection(_))));
    }
}
