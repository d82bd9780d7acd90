//! # MQTT Connection Core
//!
//! State-machine-driven broker connection handling for the broadcaster.
//! The module is organized into focused submodules:
//!
//! ```text
//! mqtt/
//! ├── config.rs        - Connection parameters and validation
//! ├── error.rs         - Error taxonomy
//! ├── link.rs          - rumqttc adapter and event normalization
//! ├── session.rs       - Connection lifecycle, watchdog, event driver
//! └── subscriptions.rs - Subscription registry for reconnect replay
//! ```
//!
//! The session exposes three externally visible states (Disconnected,
//! Connecting, Connected) and reports everything that happens through
//! [`session::SessionEvent`]s on an mpsc channel. The UI never shares
//! mutable state with the connection machinery; it only drains that
//! channel.

pub mod config;
pub mod error;
pub mod link;
pub mod session;
pub mod subscriptions;

pub use config::{ConnectionConfig, Credentials, TlsMaterial, Transport};
pub use error::MqttError;
pub use session::{ConnectionSession, ConnectionState, SessionEvent};
pub use subscriptions::SubscriptionRegistry;
