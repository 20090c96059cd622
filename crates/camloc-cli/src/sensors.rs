//! Static sensor files for the one-shot commands.
//!
//! ```toml
//! [[sensor]]
//! id = "cam1"
//! x = 0.0
//! y = 3.0
//! rotation = 0.0
//! fov = 62.2
//! last_x = 0.5
//! ```

use std::fs;
use std::path::Path;

use camloc_registry::SensorRegistry;
use camloc_types::{CamlocError, Pose, SensorId, SensorSnapshot};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SensorFile {
    #[serde(rename = "sensor", default)]
    sensors: Vec<SensorEntry>,
}

#[derive(Debug, Deserialize)]
struct SensorEntry {
    id: String,
    x: f64,
    y: f64,
    rotation: f64,
    #[serde(default)]
    fov: f64,
    #[serde(default = "centred")]
    last_x: f64,
}

fn centred() -> f64 {
    0.5
}

/// Parse a sensor file into a snapshot.
///
/// Entries go through the same validation as live traffic (fov ≥ 0,
/// `last_x ∈ [0, 1]`); a later entry with a repeated id replaces the earlier
/// one's pose.
pub fn load(path: &Path) -> Result<SensorSnapshot, CamlocError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| CamlocError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    parse(&raw)
}

pub(crate) fn parse(raw: &str) -> Result<SensorSnapshot, CamlocError> {
    let file: SensorFile = toml::from_str(raw)
        .map_err(|e| CamlocError::Config(format!("Failed to parse sensor file: {}", e)))?;

    let mut registry = SensorRegistry::new();
    for entry in file.sensors {
        let id = SensorId::new(entry.id);
        registry.apply_config(id.clone(), Pose::new(entry.x, entry.y, entry.rotation), entry.fov)?;
        registry.update_detection(&id, entry.last_x)?;
    }
    Ok(registry.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sensor_tables() {
        let snapshot = parse(
            r#"
            [[sensor]]
            id = "b"
            x = 3.0
            y = 0.0
            rotation = 90.0

            [[sensor]]
            id = "a"
            x = 0.0
            y = 3.0
            rotation = 0.0
            fov = 60.0
            last_x = 0.25
            "#,
        )
        .unwrap();

        assert_eq!(snapshot.len(), 2);
        let a = snapshot.get(&SensorId::from("a")).unwrap();
        assert_eq!(a.fov_deg, 60.0);
        assert_eq!(a.last_x, 0.25);
        let b = snapshot.get(&SensorId::from("b")).unwrap();
        assert_eq!(b.fov_deg, 0.0);
        assert_eq!(b.last_x, 0.5);
    }

    #[test]
    fn empty_file_is_empty_snapshot() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn negative_fov_is_rejected() {
        let err = parse(
            r#"
            [[sensor]]
            id = "a"
            x = 0.0
            y = 0.0
            rotation = 0.0
            fov = -5.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CamlocError::InvalidParameter { .. }));
    }

    #[test]
    fn missing_rotation_is_parse_error() {
        let err = parse("[[sensor]]\nid = \"a\"\nx = 0.0\ny = 0.0\n").unwrap_err();
        assert!(matches!(err, CamlocError::Config(_)));
    }
}
