//! Telemetry frame codec
//!
//! The stats endpoint pushes one JSON object per WebSocket message, so no
//! length framing is needed: each message is exactly one record.

use crate::types::TelemetrySample;

/// Maximum accepted frame size (64 KB); real records are ~200 bytes
const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Telemetry codec error
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Malformed telemetry record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Telemetry record out of range: {0}")]
    OutOfRange(String),

    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },
}

/// Decode one telemetry frame
pub fn decode_telemetry(frame: &[u8]) -> Result<TelemetrySample, CodecError> {
    if frame.len() > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge {
            size: frame.len(),
            max: MAX_FRAME_SIZE,
        });
    }

    let sample: TelemetrySample = serde_json::from_slice(frame)?;
    sample.validate().map_err(CodecError::OutOfRange)?;
    Ok(sample)
}
