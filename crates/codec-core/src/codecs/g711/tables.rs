//! G.711 μ-law Lookup Tables
//!
//! Pre-computed tables give O(1) companding on the per-block hot path.
//! They are generated from [`super::reference`] on first use, so results are
//! identical to the algorithmic versions.
//!
//! ## Memory Usage
//!
//! - encode table: 65536 bytes (64KB)
//! - decode table: 512 bytes (256 samples × 2 bytes)

use crate::codecs::g711::reference::{ulaw_compress, ulaw_expand};
use crate::error::Result;
use crate::utils::validation::validate_block;
use std::sync::LazyLock;

/// μ-law encoding table (16-bit linear → 8-bit μ-law), indexed by `sample + 32768`
static MULAW_ENCODE_TABLE: LazyLock<[u8; 65536]> = LazyLock::new(|| {
    let mut table = [0u8; 65536];

    for (i, entry) in table.iter_mut().enumerate() {
        let sample = (i as u16).wrapping_sub(32768) as i16;
        *entry = ulaw_compress(sample);
    }

    table
});

/// μ-law decoding table (8-bit μ-law → 16-bit linear)
static MULAW_DECODE_TABLE: LazyLock<[i16; 256]> = LazyLock::new(|| {
    let mut table = [0i16; 256];

    for (i, entry) in table.iter_mut().enumerate() {
        *entry = ulaw_expand(i as u8);
    }

    table
});

/// Force table construction so the first audio tick does not pay for it
pub fn init_tables() {
    LazyLock::force(&MULAW_ENCODE_TABLE);
    LazyLock::force(&MULAW_DECODE_TABLE);
}

/// Fast μ-law compression using lookup table
#[inline]
pub fn mulaw_compress_table(sample: i16) -> u8 {
    let index = (sample as u16).wrapping_add(32768) as usize;
    MULAW_ENCODE_TABLE[index]
}

/// Fast μ-law expansion using lookup table
#[inline]
pub fn mulaw_expand_table(encoded: u8) -> i16 {
    MULAW_DECODE_TABLE[encoded as usize]
}

/// Batch μ-law compression using lookup tables
///
/// `output` must be the same length as `samples`; nothing is written
/// otherwise.
pub fn mulaw_compress_batch_table(samples: &[i16], output: &mut [u8]) -> Result<()> {
    validate_block(samples.len(), output.len())?;

    for (out, &sample) in output.iter_mut().zip(samples) {
        *out = mulaw_compress_table(sample);
    }
    Ok(())
}

/// Batch μ-law expansion using lookup tables
///
/// `output` must be the same length as `encoded`; nothing is written
/// otherwise.
pub fn mulaw_expand_batch_table(encoded: &[u8], output: &mut [i16]) -> Result<()> {
    validate_block(encoded.len(), output.len())?;

    for (out, &code) in output.iter_mut().zip(encoded) {
        *out = mulaw_expand_table(code);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_initialization() {
        init_tables();
        assert_eq!(MULAW_ENCODE_TABLE.len(), 65536);
        assert_eq!(MULAW_DECODE_TABLE.len(), 256);
    }

    #[test]
    fn test_mulaw_table_vs_reference() {
        for sample in i16::MIN..=i16::MAX {
            assert_eq!(
                ulaw_compress(sample),
                mulaw_compress_table(sample),
                "μ-law encode mismatch for sample {}",
                sample
            );
        }

        for code in 0..=255u8 {
            assert_eq!(
                ulaw_expand(code),
                mulaw_expand_table(code),
                "μ-law decode mismatch for encoded value {}",
                code
            );
        }
    }

    #[test]
    fn test_batch_processing() {
        let samples = vec![0i16, 100, -100, 1000, -1000, 10000, -10000];
        let mut encoded = vec![0u8; samples.len()];
        let mut decoded = vec![0i16; samples.len()];

        mulaw_compress_batch_table(&samples, &mut encoded).unwrap();
        mulaw_expand_batch_table(&encoded, &mut decoded).unwrap();

        for (original, recovered) in samples.iter().zip(decoded.iter()) {
            let error = (recovered - original).abs();
            assert!(error < 700, "μ-law batch table error: {} vs {}", original, recovered);
        }

        let mut short = [0i16; 2];
        assert!(mulaw_expand_batch_table(&encoded, &mut short).is_err());
    }
}
