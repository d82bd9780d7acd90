//! Persisted application settings
//!
//! Last-used connection parameters and broadcast defaults, stored as TOML
//! in the user config directory so the forms come back pre-filled on the
//! next start. Passwords are deliberately not persisted.

use std::path::PathBuf;

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::mqtt::Transport;

const SETTINGS_DIR: &str = "mqtt-broadcaster";
const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDefaults {
    pub host: String,
    pub port: u16,
    pub transport: Transport,
    pub topic: String,
    pub qos: u8,
    pub retain: bool,
    pub use_tls: bool,
    pub username: String,
    pub auto_reconnect: bool,
    pub reconnect_delay_secs: u64,
}

impl Default for ConnectionDefaults {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            transport: Transport::Tcp,
            topic: "#".to_string(),
            qos: 0,
            retain: false,
            use_tls: false,
            username: String::new(),
            auto_reconnect: false,
            reconnect_delay_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastDefaults {
    pub message: String,
    pub count: u32,
    pub interval_ms: u64,
    pub workers: usize,
    pub append_counter: bool,
    pub targets: Vec<String>,
}

impl Default for BroadcastDefaults {
    fn default() -> Self {
        Self {
            message: String::new(),
            count: 10,
            interval_ms: 0,
            workers: 1,
            append_counter: false,
            targets: Vec::new(),
        }
    }
}

/// One saved registry entry, restored into the session on the next start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSubscription {
    pub topic: String,
    pub qos: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub connection: ConnectionDefaults,
    pub broadcast: BroadcastDefaults,
    #[serde(default)]
    pub subscriptions: Vec<SavedSubscription>,
}

impl AppSettings {
    /// Loads the settings file; any failure falls back to defaults
    pub fn load() -> Self {
        let path = match settings_path() {
            Ok(path) => path,
            Err(e) => {
                warn!("no settings location available: {e}");
                return Self::default();
            }
        };
        match std::fs::read_to_string(&path) {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(path = %path.display(), "malformed settings file, using defaults: {e}");
                    Self::default()
                }
            },
            Err(e) => {
                debug!(path = %path.display(), "no settings loaded: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = settings_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| eyre!("Failed to create settings directory: {}", e))?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(&path, raw).map_err(|e| eyre!("Failed to write settings: {}", e))?;
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }
}

fn settings_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| eyre!("No user config directory"))?;
    path.push(SETTINGS_DIR);
    path.push(SETTINGS_FILE);
    Ok(path)
}
