//! Error definitions for the MQTT module

use thiserror::Error;

/// Error taxonomy for the connection and broadcast core
///
/// Protocol-library errors never cross the session boundary in their native
/// form; they are converted into these variants or reported through the
/// session's event channel.
#[derive(Debug, Error)]
pub enum MqttError {
    /// Invalid connection parameters, reported synchronously to the caller
    #[error("invalid connection config: {0}")]
    Config(String),

    /// Underlying dial/TLS/auth failure
    #[error("connection failed: {0}")]
    Connection(String),

    /// The connect attempt exceeded the watchdog duration
    #[error("connection timeout")]
    Timeout,

    /// Publish/subscribe/unsubscribe attempted without an active connection
    #[error("not connected to broker")]
    NotConnected,

    /// Settings or stats file could not be read/written
    #[error("persistence error: {0}")]
    Persistence(String),
}
