//! Connection configuration and validation

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::MqttError;

/// Transport used for the broker connection
///
/// For [`Transport::WebSocket`] the host field carries the full `ws://` or
/// `wss://` URL; the port field is still required by the underlying client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Transport {
    #[default]
    Tcp,
    WebSocket,
}

/// Username/password pair passed to the broker on CONNECT
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// File paths for custom TLS material
///
/// When absent but `use_tls` is set, the system root store is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsMaterial {
    pub ca_cert: PathBuf,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
}

/// Everything needed for one connect attempt
///
/// Immutable once handed to `ConnectionSession::connect`; a reconnect with
/// different parameters passes a fresh config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub transport: Transport,
    /// Primary subscription filter, may contain wildcards
    pub topic: String,
    pub qos: u8,
    pub retain: bool,
    pub use_tls: bool,
    pub tls: Option<TlsMaterial>,
    pub credentials: Option<Credentials>,
    pub auto_reconnect: bool,
    pub reconnect_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            transport: Transport::Tcp,
            topic: "#".to_string(),
            qos: 0,
            retain: false,
            use_tls: false,
            tls: None,
            credentials: None,
            auto_reconnect: false,
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

impl ConnectionConfig {
    /// Checks the fields a connect attempt cannot proceed without
    pub fn validate(&self) -> Result<(), MqttError> {
        if self.host.trim().is_empty() {
            return Err(MqttError::Config("broker host is empty".to_string()));
        }
        if self.port == 0 {
            return Err(MqttError::Config("broker port must be 1-65535".to_string()));
        }
        if self.topic.trim().is_empty() {
            return Err(MqttError::Config("subscription topic is empty".to_string()));
        }
        if self.qos > 2 {
            return Err(MqttError::Config(format!("invalid QoS {}", self.qos)));
        }
        Ok(())
    }
}
