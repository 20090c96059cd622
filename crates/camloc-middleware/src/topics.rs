//! Topic names and wildcard matching.
//!
//! `+` stands for exactly one topic level holding the sensor id.  Ids are
//! restricted to ASCII letters and digits.

use camloc_types::SensorId;

/// Ask every sensor to report its configuration.
pub const ASK_FOR_CONFIG: &str = "camloc/config";
/// Sensor configuration report: `x, y, rotation, fov`.
pub const CONFIG: &str = "camloc/+/config";
/// Push a new pose to a sensor: `x, y, rotation`.
pub const SET_CONFIG: &str = "camloc/+/config/set";
/// Detection report: `last_x`.
pub const LOCATE: &str = "camloc/+/locate";
/// Flash a sensor's lights.
pub const FLASH: &str = "camloc/+/flash";
/// Ask every sensor to report its on/off state.
pub const ASK_FOR_STATE: &str = "camloc/state";
/// State report from one sensor.
pub const STATE: &str = "camloc/+/state";
/// Switch one sensor on or off.
pub const SET_STATE: &str = "camloc/+/state/set";
/// Switch every sensor on or off.
pub const SET_ALL_STATE: &str = "camloc/state/set";
/// Last-will message published when a sensor disconnects.
pub const DISCONNECT: &str = "camloc/+/dc";
/// Fused target position: `x, y`.
pub const POSITION: &str = "camloc/position";
/// Extrapolated target position for the current time: `x, y`.
pub const PREDICTED_POSITION: &str = "camloc/position/predicted";

const WILDCARD: &str = "+";

/// Extract the sensor id from `topic` if it matches `pattern`.
///
/// ```rust
/// use camloc_middleware::topics::{extract_id, LOCATE};
///
/// assert_eq!(extract_id(LOCATE, "camloc/cam1/locate").unwrap().as_str(), "cam1");
/// assert!(extract_id(LOCATE, "camloc/cam1/config").is_none());
/// ```
pub fn extract_id(pattern: &str, topic: &str) -> Option<SensorId> {
    let mut pattern_levels = pattern.split('/');
    let mut topic_levels = topic.split('/');
    let mut id = None;

    loop {
        match (pattern_levels.next(), topic_levels.next()) {
            (None, None) => return id,
            (Some(WILDCARD), Some(level)) => {
                if level.is_empty() || !level.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return None;
                }
                id.get_or_insert_with(|| SensorId::new(level));
            }
            (Some(expected), Some(level)) if expected == level => {}
            _ => return None,
        }
    }
}

/// Substitute `id` for the wildcard in `pattern`.
pub fn with_id(pattern: &str, id: &SensorId) -> String {
    pattern
        .split('/')
        .map(|level| if level == WILDCARD { id.as_str() } else { level })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_from_each_pattern() {
        assert_eq!(extract_id(CONFIG, "camloc/a1/config"), Some(SensorId::from("a1")));
        assert_eq!(extract_id(DISCONNECT, "camloc/Cam7/dc"), Some(SensorId::from("Cam7")));
        assert_eq!(extract_id(SET_STATE, "camloc/x/state/set"), Some(SensorId::from("x")));
    }

    #[test]
    fn level_count_must_match() {
        assert!(extract_id(CONFIG, "camloc/cam1/config/set").is_none());
        assert!(extract_id(SET_CONFIG, "camloc/cam1/config").is_none());
        assert!(extract_id(CONFIG, "camloc/config").is_none());
    }

    #[test]
    fn rejects_non_alphanumeric_ids() {
        assert!(extract_id(LOCATE, "camloc//locate").is_none());
        assert!(extract_id(LOCATE, "camloc/cam-1/locate").is_none());
        assert!(extract_id(LOCATE, "camloc/cam 1/locate").is_none());
    }

    #[test]
    fn literal_levels_must_match() {
        assert!(extract_id(LOCATE, "other/cam1/locate").is_none());
        assert!(extract_id(ASK_FOR_CONFIG, "camloc/config").is_none());
    }

    #[test]
    fn with_id_fills_wildcard() {
        let id = SensorId::from("cam2");
        assert_eq!(with_id(SET_CONFIG, &id), "camloc/cam2/config/set");
        assert_eq!(with_id(FLASH, &id), "camloc/cam2/flash");
        assert_eq!(with_id(POSITION, &id), POSITION);
    }

    #[test]
    fn with_id_then_extract_id() {
        let id = SensorId::from("abc123");
        assert_eq!(extract_id(STATE, &with_id(STATE, &id)), Some(id));
    }
}
