//! 16-bit little-endian sample packing
//!
//! Linear PCM travels on the wire as two bytes per sample, least significant
//! byte first, regardless of host endianness.

use super::validation::validate_block;
use crate::error::Result;

/// Pack one sample into its wire representation
#[inline]
pub fn pack_i16_le(sample: i16) -> [u8; 2] {
    sample.to_le_bytes()
}

/// Unpack one sample from its wire representation
#[inline]
pub fn unpack_i16_le(bytes: [u8; 2]) -> i16 {
    i16::from_le_bytes(bytes)
}

/// Pack a block of samples into `bytes`
///
/// `bytes` must hold exactly two bytes per sample; nothing is written
/// otherwise.
pub fn pack_block_le(samples: &[i16], bytes: &mut [u8]) -> Result<()> {
    validate_block(samples.len() * 2, bytes.len())?;

    for (chunk, &sample) in bytes.chunks_exact_mut(2).zip(samples) {
        chunk.copy_from_slice(&pack_i16_le(sample));
    }
    Ok(())
}

/// Unpack a block of wire bytes into `samples`
///
/// `bytes` must hold exactly two bytes per sample; nothing is written
/// otherwise.
pub fn unpack_block_le(bytes: &[u8], samples: &mut [i16]) -> Result<()> {
    validate_block(samples.len() * 2, bytes.len())?;

    for (sample, chunk) in samples.iter_mut().zip(bytes.chunks_exact(2)) {
        *sample = unpack_i16_le([chunk[0], chunk[1]]);
    }
    Ok(())
}
