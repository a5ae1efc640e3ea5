//! Input validation utilities for transcoder operations
//!
//! Every block operation checks its slice lengths up front so that a
//! rejected call never writes to its output.

use crate::error::{CodecError, Result};
use crate::format::AudioFormat;
use crate::types::SampleRate;
use tracing::warn;

/// Validate that a block has exactly the expected length
pub fn validate_block(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        warn!("Block size mismatch: expected {}, got {}", expected, actual);
        return Err(CodecError::frame_size(expected, actual));
    }
    Ok(())
}

/// Validate a PCM block for the given format
pub fn validate_pcm_block(format: AudioFormat, samples: &[i16]) -> Result<()> {
    validate_block(format.block_size(), samples.len())
}

/// Validate both sides of a decode or encode call
pub fn validate_block_pair(format: AudioFormat, encoded_len: usize, pcm_len: usize) -> Result<()> {
    validate_block(format.encoded_block_size(), encoded_len)?;
    validate_block(format.block_size(), pcm_len)
}

/// Validate a sample rate against a supported list
pub fn validate_sample_rate(sample_rate: SampleRate, supported: &[u32]) -> Result<()> {
    let rate_hz = sample_rate.hz();

    if !supported.contains(&rate_hz) {
        return Err(CodecError::InvalidSampleRate {
            rate: rate_hz,
            supported: supported.to_vec(),
        });
    }

    Ok(())
}
