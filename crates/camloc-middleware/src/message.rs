//! Typed views of wire traffic.
//!
//! [`Inbound::parse`] turns a raw [`WireMessage`] from a sensor into a typed
//! message; [`Command::to_wire`] does the reverse for traffic the service
//! sends out.

use camloc_types::{CamlocError, Coordinates, Pose, SensorId, WireMessage};

use crate::topics;
use crate::wire::{read_f32s, write_f32s};

/// A message received from a sensor.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Pose and field of view report.
    Config {
        id: SensorId,
        pose: Pose,
        fov_deg: f64,
    },
    /// Normalised horizontal offset of the detected target.
    Detection { id: SensorId, last_x: f64 },
    /// Last-will: the sensor went away.
    Disconnect { id: SensorId },
    /// On/off state report.
    State { id: SensorId, on: bool },
}

impl Inbound {
    /// Parse a raw message by topic.
    ///
    /// # Errors
    ///
    /// [`CamlocError::UnroutableTopic`] when the topic matches no inbound
    /// pattern, [`CamlocError::MalformedPayload`] when the payload is too
    /// short for its kind.
    pub fn parse(msg: &WireMessage) -> Result<Self, CamlocError> {
        let topic = msg.topic.as_str();

        if let Some(id) = topics::extract_id(topics::CONFIG, topic) {
            let [x, y, rotation_deg, fov_deg] = read_f32s::<4>(topic, &msg.payload)?;
            return Ok(Self::Config {
                id,
                pose: Pose::new(x, y, rotation_deg),
                fov_deg,
            });
        }
        if let Some(id) = topics::extract_id(topics::LOCATE, topic) {
            let [last_x] = read_f32s::<1>(topic, &msg.payload)?;
            return Ok(Self::Detection { id, last_x });
        }
        if let Some(id) = topics::extract_id(topics::DISCONNECT, topic) {
            return Ok(Self::Disconnect { id });
        }
        if let Some(id) = topics::extract_id(topics::STATE, topic) {
            let on = match msg.payload.first() {
                Some(byte) => *byte != 0,
                None => {
                    return Err(CamlocError::MalformedPayload {
                        topic: topic.to_string(),
                        expected: 1,
                        actual: 0,
                    });
                }
            };
            return Ok(Self::State { id, on });
        }

        Err(CamlocError::UnroutableTopic(topic.to_string()))
    }

    /// The sensor this message concerns.
    pub fn sensor_id(&self) -> &SensorId {
        match self {
            Self::Config { id, .. }
            | Self::Detection { id, .. }
            | Self::Disconnect { id }
            | Self::State { id, .. } => id,
        }
    }
}

/// A message the service sends out.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AskForConfig,
    /// Push a new pose to one sensor.
    SetConfig { id: SensorId, pose: Pose },
    Flash { id: SensorId },
    AskForState,
    SetState { id: SensorId, on: bool },
    SetAllState { on: bool },
    /// Fused position from the estimator.
    Position(Coordinates),
    /// Position extrapolated to the current time.
    PredictedPosition(Coordinates),
}

impl Command {
    /// Encode as topic + payload.
    pub fn to_wire(&self) -> WireMessage {
        match self {
            Self::AskForConfig => WireMessage::new(topics::ASK_FOR_CONFIG, Vec::new()),
            Self::SetConfig { id, pose } => WireMessage::new(
                topics::with_id(topics::SET_CONFIG, id),
                write_f32s(&[pose.x, pose.y, pose.rotation_deg]),
            ),
            Self::Flash { id } => WireMessage::new(topics::with_id(topics::FLASH, id), Vec::new()),
            Self::AskForState => WireMessage::new(topics::ASK_FOR_STATE, Vec::new()),
            Self::SetState { id, on } => {
                WireMessage::new(topics::with_id(topics::SET_STATE, id), vec![u8::from(*on)])
            }
            Self::SetAllState { on } => WireMessage::new(topics::SET_ALL_STATE, vec![u8::from(*on)]),
            Self::Position(p) => WireMessage::new(topics::POSITION, write_f32s(&[p.x, p.y])),
            Self::PredictedPosition(p) => {
                WireMessage::new(topics::PREDICTED_POSITION, write_f32s(&[p.x, p.y]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f32s(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    #[test]
    fn parses_config_report() {
        let msg = WireMessage::new("camloc/cam1/config", f32s(&[1.0, 2.0, 45.0, 62.5]));
        assert_eq!(
            Inbound::parse(&msg).unwrap(),
            Inbound::Config {
                id: SensorId::from("cam1"),
                pose: Pose::new(1.0, 2.0, 45.0),
                fov_deg: 62.5,
            }
        );
    }

    #[test]
    fn short_config_report_is_malformed() {
        let msg = WireMessage::new("camloc/cam1/config", f32s(&[1.0, 2.0, 45.0]));
        assert!(matches!(
            Inbound::parse(&msg),
            Err(CamlocError::MalformedPayload { expected: 16, actual: 12, .. })
        ));
    }

    #[test]
    fn parses_detection_and_disconnect() {
        let msg = WireMessage::new("camloc/cam2/locate", f32s(&[0.25]));
        assert_eq!(
            Inbound::parse(&msg).unwrap(),
            Inbound::Detection { id: SensorId::from("cam2"), last_x: 0.25 }
        );

        let msg = WireMessage::new("camloc/cam2/dc", b"goodbye cruel world".to_vec());
        let parsed = Inbound::parse(&msg).unwrap();
        assert_eq!(parsed, Inbound::Disconnect { id: SensorId::from("cam2") });
        assert_eq!(parsed.sensor_id().as_str(), "cam2");
    }

    #[test]
    fn parses_state_report() {
        let on = WireMessage::new("camloc/cam3/state", vec![1]);
        let off = WireMessage::new("camloc/cam3/state", vec![0]);
        assert!(matches!(Inbound::parse(&on).unwrap(), Inbound::State { on: true, .. }));
        assert!(matches!(Inbound::parse(&off).unwrap(), Inbound::State { on: false, .. }));
        assert!(Inbound::parse(&WireMessage::new("camloc/cam3/state", vec![])).is_err());
    }

    #[test]
    fn outbound_echo_is_unroutable() {
        let echo = Command::SetConfig { id: SensorId::from("cam1"), pose: Pose::default() }.to_wire();
        assert!(matches!(Inbound::parse(&echo), Err(CamlocError::UnroutableTopic(_))));
    }

    #[test]
    fn set_config_payload_is_three_fields() {
        let msg = Command::SetConfig {
            id: SensorId::from("cam1"),
            pose: Pose::new(3.5, 3.0, 69.0),
        }
        .to_wire();
        assert_eq!(msg.topic, "camloc/cam1/config/set");
        assert_eq!(msg.payload, f32s(&[3.5, 3.0, 69.0]));
    }

    #[test]
    fn state_commands_use_single_byte() {
        let one = Command::SetState { id: SensorId::from("cam1"), on: true }.to_wire();
        assert_eq!(one.topic, "camloc/cam1/state/set");
        assert_eq!(one.payload, vec![0x1]);

        let all = Command::SetAllState { on: false }.to_wire();
        assert_eq!(all.topic, "camloc/state/set");
        assert_eq!(all.payload, vec![0x0]);
    }

    #[test]
    fn position_is_two_fields() {
        let msg = Command::Position(Coordinates::new(3.0, -1.5)).to_wire();
        assert_eq!(msg.topic, "camloc/position");
        assert_eq!(msg.payload, f32s(&[3.0, -1.5]));

        let predicted = Command::PredictedPosition(Coordinates::new(0.5, 0.5)).to_wire();
        assert_eq!(predicted.topic, "camloc/position/predicted");
    }

    #[test]
    fn empty_payload_commands() {
        assert_eq!(Command::AskForConfig.to_wire(), WireMessage::new("camloc/config", vec![]));
        assert_eq!(Command::AskForState.to_wire(), WireMessage::new("camloc/state", vec![]));
        assert_eq!(
            Command::Flash { id: SensorId::from("c") }.to_wire(),
            WireMessage::new("camloc/c/flash", vec![])
        );
    }
}
