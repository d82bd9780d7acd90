//! Seam between the session and the rumqttc client
//!
//! The session only talks to [`PubSubLink`] and consumes normalized
//! [`ConnectEvent`]s, so the rest of the core never branches on
//! protocol-library types or callback-signature details.

use std::fs;
use std::time::Duration;

use rumqttc::{AsyncClient, ConnectReturnCode, QoS, TlsConfiguration};
use thiserror::Error;

use super::config::{ConnectionConfig, Transport};
use super::error::MqttError;

const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Non-blocking handoff failure to the client's internal queue
#[derive(Debug, Error)]
#[error("{0}")]
pub struct LinkError(pub String);

/// Capability contract of the underlying pub/sub client
///
/// All calls are non-blocking handoffs; delivery results come back through
/// the client's event loop. Implemented by [`RumqttcLink`] in production and
/// by mocks in tests.
pub trait PubSubLink: Send + Sync {
    fn publish(&self, topic: &str, payload: &[u8], qos: u8, retain: bool) -> Result<(), LinkError>;
    fn subscribe(&self, topic: &str, qos: u8) -> Result<(), LinkError>;
    fn unsubscribe(&self, topic: &str) -> Result<(), LinkError>;
    /// Request a clean disconnect; errors here are ignorable
    fn shutdown(&self);
}

/// Production link backed by a rumqttc [`AsyncClient`]
pub struct RumqttcLink {
    client: AsyncClient,
}

impl RumqttcLink {
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

impl PubSubLink for RumqttcLink {
    fn publish(&self, topic: &str, payload: &[u8], qos: u8, retain: bool) -> Result<(), LinkError> {
        self.client
            .try_publish(topic, qos_level(qos), retain, payload)
            .map_err(|e| LinkError(e.to_string()))
    }

    fn subscribe(&self, topic: &str, qos: u8) -> Result<(), LinkError> {
        self.client
            .try_subscribe(topic, qos_level(qos))
            .map_err(|e| LinkError(e.to_string()))
    }

    fn unsubscribe(&self, topic: &str) -> Result<(), LinkError> {
        self.client
            .try_unsubscribe(topic)
            .map_err(|e| LinkError(e.to_string()))
    }

    fn shutdown(&self) {
        let _ = self.client.try_disconnect();
    }
}

/// Normalized connect result, built at the client-event boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectEvent {
    pub success: bool,
    pub code: u8,
    pub message: Option<String>,
}

impl ConnectEvent {
    pub fn success() -> Self {
        Self {
            success: true,
            code: 0,
            message: None,
        }
    }

    pub fn failure(code: u8, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code,
            message: Some(message.into()),
        }
    }

    pub fn from_connack(code: ConnectReturnCode) -> Self {
        match code {
            ConnectReturnCode::Success => Self::success(),
            ConnectReturnCode::RefusedProtocolVersion => {
                Self::failure(1, "broker refused protocol version")
            }
            ConnectReturnCode::BadClientId => Self::failure(2, "broker rejected client id"),
            ConnectReturnCode::ServiceUnavailable => Self::failure(3, "broker service unavailable"),
            ConnectReturnCode::BadUserNamePassword => Self::failure(4, "bad username or password"),
            ConnectReturnCode::NotAuthorized => Self::failure(5, "not authorized"),
        }
    }
}

pub fn qos_level(qos: u8) -> QoS {
    match qos {
        2 => QoS::ExactlyOnce,
        1 => QoS::AtLeastOnce,
        _ => QoS::AtMostOnce,
    }
}

/// Translates a [`ConnectionConfig`] into rumqttc options
///
/// Reads TLS material from disk, so this can fail before any dial happens.
pub fn build_mqtt_options(config: &ConnectionConfig) -> Result<rumqttc::MqttOptions, MqttError> {
    let client_id = format!("mqtt-broadcaster-{}", std::process::id());
    let mut options = rumqttc::MqttOptions::new(client_id, config.host.clone(), config.port);
    options.set_keep_alive(KEEP_ALIVE);
    options.set_clean_session(true);

    if let Some(credentials) = &config.credentials {
        options.set_credentials(credentials.username.clone(), credentials.password.clone());
    }

    match (config.transport, config.use_tls) {
        (Transport::Tcp, false) => {}
        (Transport::Tcp, true) => {
            let transport = match tls_configuration(config)? {
                // System root store
                None => rumqttc::Transport::tls_with_default_config(),
                Some(tls) => rumqttc::Transport::Tls(tls),
            };
            options.set_transport(transport);
        }
        (Transport::WebSocket, false) => {
            options.set_transport(rumqttc::Transport::Ws);
        }
        (Transport::WebSocket, true) => {
            let transport = match tls_configuration(config)? {
                None => rumqttc::Transport::wss_with_default_config(),
                Some(tls) => rumqttc::Transport::Wss(tls),
            };
            options.set_transport(transport);
        }
    }

    Ok(options)
}

fn tls_configuration(config: &ConnectionConfig) -> Result<Option<TlsConfiguration>, MqttError> {
    let Some(material) = &config.tls else {
        return Ok(None);
    };

    let ca = fs::read(&material.ca_cert)
        .map_err(|e| MqttError::Connection(format!("reading CA cert: {e}")))?;

    let client_auth = match (&material.client_cert, &material.client_key) {
        (Some(cert), Some(key)) => {
            let cert = fs::read(cert)
                .map_err(|e| MqttError::Connection(format!("reading client cert: {e}")))?;
            let key = fs::read(key)
                .map_err(|e| MqttError::Connection(format!("reading client key: {e}")))?;
            Some((cert, key))
        }
        _ => None,
    };

    Ok(Some(TlsConfiguration::Simple {
        ca,
        alpn: None,
        client_auth,
    }))
}
