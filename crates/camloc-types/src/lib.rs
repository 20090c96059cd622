//! `camloc-types` – shared data model for the camloc workspace.
//!
//! Every other crate speaks in these types: planar [`Coordinates`], a
//! sensor's [`Pose`], the [`Sensor`] record kept by the registry, the
//! immutable [`SensorSnapshot`] handed to the angulation engine, and the
//! [`Event`] envelope routed over the middleware bus.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A real-valued point in the plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

impl Coordinates {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// `true` when neither component is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Location of a sensor plus the direction it faces.
///
/// `rotation_deg` is measured in degrees.  The engine only requires that
/// every pose handed to it uses the same zero reference and sign convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub rotation_deg: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, rotation_deg: f64) -> Self {
        Self { x, y, rotation_deg }
    }

    /// The sensor's location without its facing angle.
    pub fn origin(&self) -> Coordinates {
        Coordinates::new(self.x, self.y)
    }
}

/// One angle-reporting sensor ("camera") as kept in the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub pose: Pose,
    /// Full horizontal field of view (degrees, ≥ 0).
    pub fov_deg: f64,
    /// Normalised horizontal offset of the last detection within the frame:
    /// 0 = left edge, 0.5 = centre, 1 = right edge.
    pub last_x: f64,
}

impl Sensor {
    /// A freshly configured sensor that has not reported a detection yet.
    pub fn new(pose: Pose, fov_deg: f64) -> Self {
        Self {
            pose,
            fov_deg,
            last_x: 0.0,
        }
    }

    /// Builder-style helper setting the detection offset.
    pub fn with_last_x(mut self, last_x: f64) -> Self {
        self.last_x = last_x;
        self
    }
}

/// Opaque sensor identifier, usually the id segment of a wire topic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorId(String);

impl SensorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SensorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SensorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Immutable, point-in-time copy of the sensor registry.
///
/// Backed by a [`BTreeMap`] so iteration is always ordered by [`SensorId`];
/// pair enumeration over a snapshot is therefore reproducible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorSnapshot {
    sensors: BTreeMap<SensorId, Sensor>,
}

impl SensorSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn get(&self, id: &SensorId) -> Option<&Sensor> {
        self.sensors.get(id)
    }

    /// Iterate sensors in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (&SensorId, &Sensor)> {
        self.sensors.iter()
    }
}

impl FromIterator<(SensorId, Sensor)> for SensorSnapshot {
    fn from_iter<I: IntoIterator<Item = (SensorId, Sensor)>>(iter: I) -> Self {
        Self {
            sensors: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<(&'a SensorId, &'a Sensor)> for SensorSnapshot {
    fn from_iter<I: IntoIterator<Item = (&'a SensorId, &'a Sensor)>>(iter: I) -> Self {
        iter.into_iter().map(|(id, s)| (id.clone(), *s)).collect()
    }
}

/// A fused position at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedSample {
    pub position: Coordinates,
    pub timestamp: DateTime<Utc>,
}

impl TimedSample {
    pub fn new(position: Coordinates, timestamp: DateTime<Utc>) -> Self {
        Self {
            position,
            timestamp,
        }
    }
}

/// A raw message as seen by the transport: topic plus opaque payload bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl WireMessage {
    pub fn new(topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}

/// Unified event wrapper for the middleware bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g. `"camloc-middleware::service"`
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Wrap `payload` in a fresh event stamped with the current time.
    pub fn now(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Variants of data routed over the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    /// Traffic to or from the transport layer.
    Wire(WireMessage),
    /// A freshly fused target position.
    Position(TimedSample),
    /// A fault raised while handling traffic.
    Fault { component: String, message: String },
}

/// Crate-wide error type for the camloc workspace.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CamlocError {
    #[error("Invalid time span: both samples are stamped {at}")]
    InvalidTimeSpan { at: DateTime<Utc> },

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Unknown sensor: {0}")]
    UnknownSensor(SensorId),

    #[error("Malformed payload on {topic}: expected at least {expected} bytes, got {actual}")]
    MalformedPayload {
        topic: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unroutable topic: {0}")]
    UnroutableTopic(String),

    #[error("Channel Error: {0}")]
    Channel(String),

    #[error("Config Error: {0}")]
    Config(String),
}
