use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use eframe::egui::{
    self, Color32, ComboBox, Context, DragValue, ProgressBar, RichText, ScrollArea, TextEdit,
};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::broadcast::{BroadcastDispatcher, BroadcastEvent, BroadcastHandle, BroadcastRequest};
use crate::mqtt::{ConnectionConfig, ConnectionSession, Credentials, SessionEvent, Transport};
use crate::settings::{AppSettings, SavedSubscription};
use crate::stats::ChannelStatsStore;

const MAX_LOG_LINES: usize = 1000;

#[derive(Clone, Copy, PartialEq, Eq)]
enum LineKind {
    System,
    Error,
    Broadcast,
    Message,
}

struct LogLine {
    timestamp: NaiveDateTime,
    channel: String,
    body: String,
    kind: LineKind,
}

impl LogLine {
    fn now(channel: impl Into<String>, body: impl Into<String>, kind: LineKind) -> Self {
        Self {
            timestamp: chrono::Local::now().naive_local(),
            channel: channel.into(),
            body: body.into(),
            kind,
        }
    }

    fn color(&self) -> Color32 {
        match self.kind {
            LineKind::System => Color32::LIGHT_BLUE,
            LineKind::Error => Color32::LIGHT_RED,
            LineKind::Broadcast => Color32::LIGHT_YELLOW,
            LineKind::Message => Color32::LIGHT_GREEN,
        }
    }
}

pub struct BroadcasterApp {
    session: ConnectionSession,
    dispatcher: BroadcastDispatcher,
    stats: Arc<ChannelStatsStore>,
    session_rx: mpsc::Receiver<SessionEvent>,
    broadcast_rx: mpsc::Receiver<BroadcastEvent>,

    // Connection form
    host: String,
    port_text: String,
    transport: Transport,
    topic: String,
    qos: u8,
    retain: bool,
    use_tls: bool,
    username: String,
    password: String,
    auto_reconnect: bool,
    reconnect_delay_secs: u64,

    // Subscription form
    subscribe_topic: String,
    subscribe_qos: u8,

    // Broadcast form
    message: String,
    count_text: String,
    interval_text: String,
    workers: usize,
    append_counter: bool,
    targets_text: String,

    // Runtime state
    connected: bool,
    connecting: bool,
    status: String,
    broadcast: Option<BroadcastHandle>,
    progress: f32,
    log: VecDeque<LogLine>,
}

impl BroadcasterApp {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        session: ConnectionSession,
        dispatcher: BroadcastDispatcher,
        stats: Arc<ChannelStatsStore>,
        session_rx: mpsc::Receiver<SessionEvent>,
        broadcast_rx: mpsc::Receiver<BroadcastEvent>,
        settings: AppSettings,
    ) -> Self {
        let c = settings.connection;
        let b = settings.broadcast;
        session.restore_subscriptions(
            settings
                .subscriptions
                .into_iter()
                .map(|s| (s.topic, s.qos)),
        );
        Self {
            session,
            dispatcher,
            stats,
            session_rx,
            broadcast_rx,
            host: c.host,
            port_text: c.port.to_string(),
            transport: c.transport,
            topic: c.topic,
            qos: c.qos,
            retain: c.retain,
            use_tls: c.use_tls,
            username: c.username,
            password: String::new(),
            auto_reconnect: c.auto_reconnect,
            reconnect_delay_secs: c.reconnect_delay_secs.max(1),
            subscribe_topic: String::new(),
            subscribe_qos: 0,
            message: b.message,
            count_text: b.count.to_string(),
            interval_text: b.interval_ms.to_string(),
            workers: b.workers.max(1),
            append_counter: b.append_counter,
            targets_text: b.targets.join("\n"),
            connected: false,
            connecting: false,
            status: "Disconnected".to_string(),
            broadcast: None,
            progress: 0.0,
            log: VecDeque::new(),
        }
    }

    fn current_settings(&self) -> AppSettings {
        AppSettings {
            connection: crate::settings::ConnectionDefaults {
                host: self.host.clone(),
                port: self.port_text.trim().parse().unwrap_or(1883),
                transport: self.transport,
                topic: self.topic.clone(),
                qos: self.qos,
                retain: self.retain,
                use_tls: self.use_tls,
                username: self.username.clone(),
                auto_reconnect: self.auto_reconnect,
                reconnect_delay_secs: self.reconnect_delay_secs,
            },
            broadcast: crate::settings::BroadcastDefaults {
                message: self.message.clone(),
                count: self.count_text.trim().parse().unwrap_or(10),
                interval_ms: self.interval_text.trim().parse().unwrap_or(0),
                workers: self.workers,
                append_counter: self.append_counter,
                targets: self.parse_targets(),
            },
            subscriptions: self
                .session
                .subscriptions()
                .into_iter()
                .map(|(topic, qos)| SavedSubscription { topic, qos })
                .collect(),
        }
    }

    fn push_log(&mut self, line: LogLine) {
        self.log.push_back(line);
        while self.log.len() > MAX_LOG_LINES {
            self.log.pop_front();
        }
    }

    fn parse_targets(&self) -> Vec<String> {
        let mut targets = Vec::new();
        for line in self.targets_text.lines() {
            let line = line.trim();
            if !line.is_empty() && !targets.iter().any(|t| t == line) {
                targets.push(line.to_string());
            }
        }
        targets
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.session_rx.try_recv() {
            match event {
                SessionEvent::ConnectionResult { success, error } => {
                    self.connecting = false;
                    self.connected = success;
                    if success {
                        self.status = format!("Connected to {}", self.host);
                        self.push_log(LogLine::now("System", "Connected", LineKind::System));
                    } else {
                        let reason = error.unwrap_or_else(|| "unknown error".to_string());
                        self.status = format!("Connection failed: {reason}");
                        self.push_log(LogLine::now("Error", reason, LineKind::Error));
                    }
                }
                SessionEvent::Message { topic, payload } => {
                    self.push_log(LogLine::now(
                        topic,
                        render_payload(&payload),
                        LineKind::Message,
                    ));
                }
                SessionEvent::Disconnected { reason_code } => {
                    self.connected = false;
                    self.connecting = false;
                    self.status = if reason_code == 0 {
                        "Disconnected".to_string()
                    } else {
                        format!("Connection lost (code {reason_code})")
                    };
                    self.push_log(LogLine::now(
                        "System",
                        self.status.clone(),
                        if reason_code == 0 {
                            LineKind::System
                        } else {
                            LineKind::Error
                        },
                    ));
                }
            }
        }

        while let Ok(event) = self.broadcast_rx.try_recv() {
            match event {
                BroadcastEvent::Progress(fraction) => self.progress = fraction,
                BroadcastEvent::JobFailed { topic, error } => {
                    self.push_log(LogLine::now(
                        "Error",
                        format!("Send to {topic} failed: {error}"),
                        LineKind::Error,
                    ));
                }
                BroadcastEvent::Complete {
                    total_sent,
                    failed_sends,
                } => {
                    self.broadcast = None;
                    self.progress = 0.0;
                    let summary =
                        format!("Broadcast complete. Sent: {total_sent}, Failed: {failed_sends}");
                    self.status = summary.clone();
                    self.push_log(LogLine::now("Broadcast", summary, LineKind::Broadcast));
                }
            }
        }
    }

    fn start_connect(&mut self) {
        let port = match self.port_text.trim().parse::<u16>() {
            Ok(port) => port,
            Err(_) => {
                self.push_log(LogLine::now("Error", "Invalid port", LineKind::Error));
                return;
            }
        };
        let credentials = if self.username.trim().is_empty() {
            None
        } else {
            Some(Credentials {
                username: self.username.clone(),
                password: self.password.clone(),
            })
        };
        let config = ConnectionConfig {
            host: self.host.trim().to_string(),
            port,
            transport: self.transport,
            topic: self.topic.trim().to_string(),
            qos: self.qos,
            retain: self.retain,
            use_tls: self.use_tls,
            tls: None,
            credentials,
            auto_reconnect: self.auto_reconnect,
            reconnect_delay: Duration::from_secs(self.reconnect_delay_secs.max(1)),
        };
        match self.session.connect(config) {
            Ok(()) => {
                self.connecting = true;
                self.status = format!("Connecting to {}...", self.host);
                self.push_log(LogLine::now(
                    "System",
                    self.status.clone(),
                    LineKind::System,
                ));
            }
            Err(e) => {
                self.status = e.to_string();
                self.push_log(LogLine::now("Error", e.to_string(), LineKind::Error));
            }
        }
    }

    fn start_broadcast(&mut self) {
        let count = match self.count_text.trim().parse::<u32>() {
            Ok(count) if count >= 1 => count,
            _ => {
                self.push_log(LogLine::now(
                    "Error",
                    "Message count must be a number >= 1",
                    LineKind::Error,
                ));
                return;
            }
        };
        let interval_ms = self.interval_text.trim().parse::<u64>().unwrap_or(0);
        if self.message.trim().is_empty() {
            self.push_log(LogLine::now(
                "Error",
                "Enter a message to broadcast",
                LineKind::Error,
            ));
            return;
        }
        let mut targets = self.parse_targets();
        if targets.is_empty() {
            // Fall back to the connection's primary topic.
            targets.push(self.topic.trim().to_string());
        }

        let request = BroadcastRequest {
            message: self.message.clone(),
            count,
            targets,
            delay: Duration::from_millis(interval_ms),
            workers: self.workers.max(1),
            append_counter: self.append_counter,
        };
        match self.dispatcher.start(request) {
            Ok(handle) => {
                self.broadcast = Some(handle);
                self.progress = 0.0;
                self.push_log(LogLine::now(
                    "Broadcast",
                    "Starting broadcast...",
                    LineKind::Broadcast,
                ));
            }
            Err(e) => {
                self.push_log(LogLine::now("Error", e.to_string(), LineKind::Error));
            }
        }
    }

    fn connection_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Connection");
        egui::Grid::new("connection_grid")
            .num_columns(2)
            .show(ui, |ui| {
                ui.label("Host");
                ui.add(TextEdit::singleline(&mut self.host).hint_text("broker.example.com"));
                ui.end_row();

                ui.label("Port");
                ui.add(TextEdit::singleline(&mut self.port_text).desired_width(60.0));
                ui.end_row();

                ui.label("Transport");
                ComboBox::from_id_salt("transport")
                    .selected_text(match self.transport {
                        Transport::Tcp => "TCP",
                        Transport::WebSocket => "WebSocket",
                    })
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut self.transport, Transport::Tcp, "TCP");
                        ui.selectable_value(
                            &mut self.transport,
                            Transport::WebSocket,
                            "WebSocket",
                        );
                    });
                ui.end_row();

                ui.label("Topic");
                ui.add(TextEdit::singleline(&mut self.topic).hint_text("#"));
                ui.end_row();

                ui.label("QoS");
                ui.add(DragValue::new(&mut self.qos).range(0..=2));
                ui.end_row();

                ui.label("Username");
                ui.text_edit_singleline(&mut self.username);
                ui.end_row();

                ui.label("Password");
                ui.add(TextEdit::singleline(&mut self.password).password(true));
                ui.end_row();
            });

        ui.horizontal(|ui| {
            ui.checkbox(&mut self.use_tls, "TLS");
            ui.checkbox(&mut self.retain, "Retain");
            ui.checkbox(&mut self.auto_reconnect, "Auto-reconnect");
            if self.auto_reconnect {
                ui.add(
                    DragValue::new(&mut self.reconnect_delay_secs)
                        .range(1..=300)
                        .suffix(" s"),
                );
            }
        });

        ui.horizontal(|ui| {
            let connect_enabled = !self.connected && !self.connecting;
            if ui
                .add_enabled(connect_enabled, egui::Button::new("Connect"))
                .clicked()
            {
                self.start_connect();
            }
            if ui
                .add_enabled(self.connected || self.connecting, egui::Button::new("Disconnect"))
                .clicked()
            {
                self.session.disconnect();
            }
        });

        ui.separator();
        ui.heading("Subscriptions");
        ui.horizontal(|ui| {
            ui.add(
                TextEdit::singleline(&mut self.subscribe_topic)
                    .hint_text("topic/filter")
                    .desired_width(140.0),
            );
            ui.add(DragValue::new(&mut self.subscribe_qos).range(0..=2));
            if ui.button("Subscribe").clicked() {
                let topic = self.subscribe_topic.trim().to_string();
                if !topic.is_empty() {
                    if let Err(e) = self.session.subscribe(&topic, self.subscribe_qos) {
                        self.push_log(LogLine::now("Error", e.to_string(), LineKind::Error));
                    }
                }
            }
            if ui.button("Unsubscribe").clicked() {
                let topic = self.subscribe_topic.trim().to_string();
                if !topic.is_empty() {
                    if let Err(e) = self.session.unsubscribe(&topic) {
                        self.push_log(LogLine::now("Error", e.to_string(), LineKind::Error));
                    }
                }
            }
        });
        for (topic, qos) in self.session.subscriptions() {
            ui.label(format!("{topic} (QoS {qos})"));
        }
    }

    fn broadcast_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Broadcast");
        ui.label("Message");
        ui.add(
            TextEdit::multiline(&mut self.message)
                .hint_text("Enter message content here")
                .desired_rows(3),
        );
        egui::Grid::new("broadcast_grid")
            .num_columns(2)
            .show(ui, |ui| {
                ui.label("Count");
                ui.add(TextEdit::singleline(&mut self.count_text).desired_width(80.0));
                ui.end_row();

                ui.label("Interval (ms)");
                ui.add(TextEdit::singleline(&mut self.interval_text).desired_width(80.0));
                ui.end_row();

                ui.label("Workers");
                ui.add(DragValue::new(&mut self.workers).range(1..=64));
                ui.end_row();
            });
        ui.checkbox(&mut self.append_counter, "Append message counter");
        ui.label("Target topics (one per line, blank = primary topic)");
        ui.add(
            TextEdit::multiline(&mut self.targets_text)
                .hint_text("load/1\nload/2")
                .desired_rows(4),
        );

        let running = self.broadcast.is_some();
        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.connected && !running, egui::Button::new("Start Broadcast"))
                .clicked()
            {
                self.start_broadcast();
            }
            if ui
                .add_enabled(running, egui::Button::new("Cancel"))
                .clicked()
            {
                if let Some(handle) = &self.broadcast {
                    handle.cancel();
                    self.push_log(LogLine::now(
                        "Broadcast",
                        "Cancelling broadcast...",
                        LineKind::Broadcast,
                    ));
                }
            }
        });
        if running {
            ui.add(ProgressBar::new(self.progress).show_percentage());
        }
    }

    fn message_log(&mut self, ui: &mut egui::Ui) {
        ScrollArea::vertical()
            .stick_to_bottom(true)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for line in &self.log {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(
                            RichText::new(format!("[{}]", line.timestamp.format("%H:%M:%S")))
                                .weak(),
                        );
                        ui.label(
                            RichText::new(format!("{}:", line.channel))
                                .color(line.color())
                                .strong(),
                        );
                        ui.label(&line.body);
                    });
                }
            });
    }
}

impl eframe::App for BroadcasterApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        egui::SidePanel::left("controls")
            .min_width(280.0)
            .show(ctx, |ui| {
                ScrollArea::vertical().show(ui, |ui| {
                    self.connection_panel(ui);
                    ui.separator();
                    self.broadcast_panel(ui);
                });
            });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let totals = self.stats.totals();
            ui.horizontal(|ui| {
                ui.label(&self.status);
                ui.separator();
                ui.label(format!(
                    "Received: {} | Sent: {} | Topics: {}",
                    totals.received, totals.sent, totals.topics
                ));
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.message_log(ui);
        });

        // Keep draining events while idle.
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

impl Drop for BroadcasterApp {
    fn drop(&mut self) {
        if let Err(e) = self.current_settings().save() {
            error!("saving settings failed: {e}");
        }
        self.stats.save();
        self.session.disconnect();
        info!("application state saved");
    }
}

/// Pretty-print JSON payloads for the log, pass everything else through
fn render_payload(payload: &[u8]) -> String {
    let text = String::from_utf8_lossy(payload);
    let trimmed = text.trim();
    if (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
    {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
            if let Ok(pretty) = serde_json::to_string_pretty(&value) {
                return pretty;
            }
        }
    }
    text.into_owned()
}
