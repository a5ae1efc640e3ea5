//! Signed linear PCM transcoders
//!
//! 16-bit little-endian samples at 8, 16 or 48 kHz. The wire format is the
//! PCM itself, so decode and encode are lossless byte-order conversions.
//!
//! - [`Slin8kTranscoder`] conceals lost blocks with the same engine as
//!   μ-law, since narrowband legs are the loss-prone ones.
//! - [`SlinTranscoder`] covers 16 and 48 kHz and fills gaps with silence.

#[cfg(test)]
mod tests;

use crate::error::{CodecError, Result};
use crate::format::AudioFormat;
use crate::plc::Plc;
use crate::types::{Transcoder, TranscoderConfig};
use crate::utils::pcm::{pack_block_le, unpack_block_le};
use crate::utils::validation::{validate_block_pair, validate_pcm_block};
use tracing::debug;

const SLIN_8K_BLOCK: usize = AudioFormat::Slin8k.block_size();

fn check_format(config: &TranscoderConfig, accepted: &[AudioFormat]) -> Result<()> {
    if !accepted.contains(&config.format) {
        return Err(CodecError::invalid_config(format!(
            "linear transcoder cannot handle {}",
            config.format
        )));
    }
    config.validate()
}

/// Linear PCM @ 8 kHz with loss concealment
#[derive(Debug, Clone)]
pub struct Slin8kTranscoder {
    plc: Plc,
}

impl Slin8kTranscoder {
    /// Create a new 8 kHz linear transcoder
    pub fn new(config: &TranscoderConfig) -> Result<Self> {
        check_format(config, &[AudioFormat::Slin8k])?;

        let plc = Plc::new(config.plc.clone())?;
        debug!("Created {} transcoder", AudioFormat::Slin8k);

        Ok(Self { plc })
    }

    /// Concealment engine for the inbound direction
    pub fn plc(&self) -> &Plc {
        &self.plc
    }
}

impl Transcoder for Slin8kTranscoder {
    fn decode(&mut self, encoded: &[u8], pcm_out: &mut [i16]) -> Result<()> {
        validate_block_pair(AudioFormat::Slin8k, encoded.len(), pcm_out.len())?;

        let mut pcm = [0i16; SLIN_8K_BLOCK];
        unpack_block_le(encoded, &mut pcm)?;
        self.plc.good_frames(&pcm, pcm_out)
    }

    fn decode_gap(&mut self, pcm_out: &mut [i16]) -> Result<()> {
        validate_pcm_block(AudioFormat::Slin8k, pcm_out)?;
        self.plc.bad_frames(pcm_out)
    }

    fn encode(&self, pcm_in: &[i16], encoded_out: &mut [u8]) -> Result<()> {
        validate_block_pair(AudioFormat::Slin8k, encoded_out.len(), pcm_in.len())?;
        pack_block_le(pcm_in, encoded_out)
    }

    fn reset(&mut self) {
        self.plc.reset();
    }

    fn format(&self) -> AudioFormat {
        AudioFormat::Slin8k
    }
}

/// Linear PCM @ 16 or 48 kHz; lost blocks become silence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlinTranscoder {
    format: AudioFormat,
}

impl SlinTranscoder {
    /// Create a new wideband linear transcoder
    ///
    /// # Errors
    ///
    /// Returns an error unless `config` selects SLIN16 or SLIN48.
    pub fn new(config: &TranscoderConfig) -> Result<Self> {
        check_format(config, &[AudioFormat::Slin16k, AudioFormat::Slin48k])?;
        debug!("Created {} transcoder", config.format);

        Ok(Self {
            format: config.format,
        })
    }

    /// 16 kHz linear transcoder
    pub fn slin16k() -> Self {
        Self {
            format: AudioFormat::Slin16k,
        }
    }

    /// 48 kHz linear transcoder
    pub fn slin48k() -> Self {
        Self {
            format: AudioFormat::Slin48k,
        }
    }
}

impl Transcoder for SlinTranscoder {
    fn decode(&mut self, encoded: &[u8], pcm_out: &mut [i16]) -> Result<()> {
        validate_block_pair(self.format, encoded.len(), pcm_out.len())?;
        unpack_block_le(encoded, pcm_out)
    }

    fn decode_gap(&mut self, pcm_out: &mut [i16]) -> Result<()> {
        validate_pcm_block(self.format, pcm_out)?;
        pcm_out.fill(0);
        Ok(())
    }

    fn encode(&self, pcm_in: &[i16], encoded_out: &mut [u8]) -> Result<()> {
        validate_block_pair(self.format, encoded_out.len(), pcm_in.len())?;
        pack_block_le(pcm_in, encoded_out)
    }

    fn reset(&mut self) {}

    fn format(&self) -> AudioFormat {
        self.format
    }
}
