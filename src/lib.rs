//! MQTT broadcaster: connection-lifecycle and concurrent-broadcast core
//! with a thin egui shell on top.

pub mod broadcast;
pub mod mqtt;
pub mod settings;
pub mod stats;
pub mod ui;
