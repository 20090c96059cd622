//! Big-endian `f32` field codec.
//!
//! Every numeric payload on the wire is a run of 4-byte big-endian IEEE-754
//! floats.  The engine works in `f64`; values are widened on decode and
//! narrowed on encode.

use camloc_types::CamlocError;

const FIELD_LEN: usize = 4;

/// Decode the first `N` big-endian `f32` fields of `payload`.
///
/// Trailing bytes are ignored.
///
/// # Errors
///
/// Returns [`CamlocError::MalformedPayload`] when `payload` is shorter than
/// `4 * N` bytes.
pub fn read_f32s<const N: usize>(topic: &str, payload: &[u8]) -> Result<[f64; N], CamlocError> {
    let expected = N * FIELD_LEN;
    if payload.len() < expected {
        return Err(CamlocError::MalformedPayload {
            topic: topic.to_string(),
            expected,
            actual: payload.len(),
        });
    }

    let mut fields = [0.0; N];
    for (field, chunk) in fields.iter_mut().zip(payload.chunks_exact(FIELD_LEN)) {
        let bytes: [u8; FIELD_LEN] = [chunk[0], chunk[1], chunk[2], chunk[3]];
        *field = f64::from(f32::from_be_bytes(bytes));
    }
    Ok(fields)
}

/// Encode `values` as consecutive big-endian `f32` fields.
pub fn write_f32s(values: &[f64]) -> Vec<u8> {
    values
        .iter()
        .flat_map(|v| (*v as f32).to_be_bytes())
        .collect()
}
