//! `camloc-middleware` – transport boundary and service loop.
//!
//! Sits between the wire (topic + big-endian payload bytes) and the
//! angulation engine, without the engine ever seeing a byte.
//!
//! # Modules
//!
//! - [`topics`] – topic patterns with `+` wildcards and sensor-id extraction.
//! - [`wire`] – big-endian `f32` field codec.
//! - [`message`] – [`Inbound`] parsing and [`Command`] encoding.
//! - [`bus`] – lane-partitioned publish/subscribe event bus built on Tokio
//!   broadcast channels.
//! - [`service`] – [`LocatorService`]: applies inbound traffic to the sensor
//!   registry, runs the estimator, publishes fused and predicted positions.
//! - [`bridge`] – [`MqttBridge`]: moves traffic between the MQTT broker and
//!   the bus.

pub mod bridge;
pub mod bus;
pub mod message;
pub mod service;
pub mod topics;
pub mod wire;

pub use bridge::{BridgeOptions, MqttBridge};
pub use bus::{EventBus, Lane, LaneReceiver};
pub use message::{Command, Inbound};
pub use service::{LocatorService, ServiceOptions};
