use std::sync::Arc;

use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use mqtt_broadcaster::broadcast::{BroadcastDispatcher, Publisher};
use mqtt_broadcaster::mqtt::ConnectionSession;
use mqtt_broadcaster::settings::AppSettings;
use mqtt_broadcaster::stats::{ChannelStatsStore, STATS_FILE};
use mqtt_broadcaster::ui::BroadcasterApp;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let settings = AppSettings::load();
    let stats = Arc::new(ChannelStatsStore::load(STATS_FILE));
    info!(
        topics = stats.totals().topics,
        "loaded persisted channel stats"
    );

    let (session_tx, session_rx) = mpsc::channel(256);
    let (broadcast_tx, broadcast_rx) = mpsc::channel(512);

    let session = ConnectionSession::new(session_tx, stats.clone());
    let publisher: Arc<dyn Publisher> = Arc::new(session.clone());
    let dispatcher = BroadcastDispatcher::new(publisher, stats.clone(), broadcast_tx);

    info!("Starting UI");
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default().with_inner_size([1100.0, 720.0]);

    eframe::run_native(
        "MQTT Broadcaster",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(BroadcasterApp::new(
                cc,
                session,
                dispatcher,
                stats,
                session_rx,
                broadcast_rx,
                settings,
            )))
        }),
    )
    .map_err(|e| eyre!("UI error: {e}"))?;

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
    Ok(())
}
