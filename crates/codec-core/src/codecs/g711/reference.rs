//! G.711 μ-law Reference Implementation
//!
//! Per-sample μ-law companding as specified in ITU-T Recommendation G.711,
//! following the ITU-T Software Tools Library (STL) G.711 module bit for bit.
//!
//! ## Reference
//!
//! - ITU-T Recommendation G.711: "Pulse code modulation (PCM) of voice frequencies"
//! - ITU-T Software Tools Library (STL) - G.711 module
//!
//! ## Algorithm Details
//!
//! - Uses the 14 most significant bits of the input
//! - Adds a bias of 33 (0x21) before segment search
//! - Output is the 1's complement of sign, segment and mantissa
//! - Inputs beyond ±32124 saturate in the top segment

use crate::error::Result;
use crate::utils::validation::validate_block;

/// Largest magnitude μ-law can represent
pub const ULAW_MAX: i16 = 32124;

/// μ-law compression according to ITU-T G.711
///
/// Compresses a 16-bit linear PCM sample to 8-bit μ-law encoding.
///
/// # Arguments
///
/// * `sample` - Input linear PCM sample (16-bit signed)
///
/// # Returns
///
/// μ-law encoded sample (8-bit)
pub fn ulaw_compress(sample: i16) -> u8 {
    // 1's complement keeps -32768 in range
    let absno = if sample < 0 {
        (((!sample) as u16) >> 2) as i16 + 33
    } else {
        (sample >> 2) + 33
    };

    let absno = absno.min(0x1FFF);

    let mut i = absno >> 6;
    let mut segno = 1;
    while i != 0 {
        segno += 1;
        i >>= 1;
    }

    let high_nibble = 0x0008 - segno;
    let low_nibble = 0x000F - ((absno >> segno) & 0x000F);
    let mut result = (high_nibble << 4) | low_nibble;

    if sample >= 0 {
        result |= 0x0080;
    }

    result as u8
}

/// μ-law expansion according to ITU-T G.711
///
/// Expands an 8-bit μ-law encoded sample to 16-bit linear PCM. Every code
/// maps into `-ULAW_MAX..=ULAW_MAX`; both 0x7F and 0xFF decode to zero.
pub fn ulaw_expand(compressed: u8) -> i16 {
    let sign = if compressed < 0x0080 { -1 } else { 1 };
    let mantissa = (!compressed) as i16;
    let exponent = (mantissa >> 4) & 0x0007;
    let segment = exponent + 1;
    let mantissa = mantissa & 0x000F;

    let step = 4 << segment;

    sign * ((0x0080 << exponent) + step * mantissa + step / 2 - 4 * 33)
}

/// Batch μ-law compression
///
/// `output` must be the same length as `samples`; nothing is written
/// otherwise.
pub fn ulaw_compress_batch(samples: &[i16], output: &mut [u8]) -> Result<()> {
    validate_block(samples.len(), output.len())?;

    for (out, &sample) in output.iter_mut().zip(samples) {
        *out = ulaw_compress(sample);
    }
    Ok(())
}

/// Batch μ-law expansion
///
/// `output` must be the same length as `encoded`; nothing is written
/// otherwise.
pub fn ulaw_expand_batch(encoded: &[u8], output: &mut [i16]) -> Result<()> {
    validate_block(encoded.len(), output.len())?;

    for (out, &code) in output.iter_mut().zip(encoded) {
        *out = ulaw_expand(code);
    }
    Ok(())
}
