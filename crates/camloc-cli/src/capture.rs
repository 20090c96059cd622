//! JSON-lines capture files for `camloc replay`.
//!
//! Each non-empty line is one message:
//!
//! ```text
//! {"at_ms": 0,   "topic": "camloc/cam1/config", "floats": [0, 3, 0, 62.2]}
//! {"at_ms": 40,  "topic": "camloc/cam1/locate", "payload": [63, 0, 0, 0]}
//! {"at_ms": 900, "topic": "camloc/cam1/dc"}
//! ```
//!
//! `floats` is a shorthand encoded as big-endian `f32` fields; when present
//! it replaces `payload`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use camloc_middleware::wire::write_f32s;
use camloc_types::{CamlocError, WireMessage};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CaptureLine {
    #[serde(default)]
    at_ms: u64,
    topic: String,
    #[serde(default)]
    payload: Vec<u8>,
    #[serde(default)]
    floats: Option<Vec<f64>>,
}

/// One captured message and its offset from the start of the capture.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRecord {
    pub offset: Duration,
    pub message: WireMessage,
}

pub fn load(path: &Path) -> Result<Vec<CaptureRecord>, CamlocError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| CamlocError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    parse(&raw)
}

pub(crate) fn parse(raw: &str) -> Result<Vec<CaptureRecord>, CamlocError> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            let parsed: CaptureLine = serde_json::from_str(line)
                .map_err(|e| CamlocError::Config(format!("capture line {}: {}", n + 1, e)))?;
            let payload = match parsed.floats {
                Some(floats) => write_f32s(&floats),
                None => parsed.payload,
            };
            Ok(CaptureRecord {
                offset: Duration::from_millis(parsed.at_ms),
                message: WireMessage::new(parsed.topic, payload),
            })
        })
        .collect()
}
