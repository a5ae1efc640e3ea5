//! G.711 μ-law transcoder
//!
//! Decodes 160-byte μ-law blocks into 160 PCM samples at 8 kHz and back.
//! Lost blocks are concealed: every block passes through a [`Plc`] engine
//! as two 10 ms frames.
//!
//! ## Usage
//!
//! ```rust
//! use amp_codec_core::codecs::g711::G711UlawTranscoder;
//! use amp_codec_core::types::{Transcoder, TranscoderConfig};
//!
//! let mut transcoder = G711UlawTranscoder::new(&TranscoderConfig::g711_ulaw())?;
//!
//! let pcm = [0i16; 160];
//! let mut wire = [0u8; 160];
//! transcoder.encode(&pcm, &mut wire)?;
//!
//! let mut decoded = [0i16; 160];
//! transcoder.decode(&wire, &mut decoded)?;
//! transcoder.decode_gap(&mut decoded)?;
//! # Ok::<(), amp_codec_core::CodecError>(())
//! ```

pub mod reference;
pub mod tables;

#[cfg(test)]
mod tests;

pub use reference::{ULAW_MAX, ulaw_compress, ulaw_compress_batch, ulaw_expand, ulaw_expand_batch};
pub use tables::{
    init_tables, mulaw_compress_batch_table, mulaw_compress_table, mulaw_expand_batch_table,
    mulaw_expand_table,
};

use crate::error::{CodecError, Result};
use crate::format::AudioFormat;
use crate::plc::Plc;
use crate::types::{Transcoder, TranscoderConfig};
use crate::utils::validation::{validate_block_pair, validate_pcm_block};
use tracing::debug;

const FORMAT: AudioFormat = AudioFormat::G711Ulaw;
const BLOCK_SIZE: usize = FORMAT.block_size();

/// G.711 μ-law @ 8 kHz with loss concealment
#[derive(Debug, Clone)]
pub struct G711UlawTranscoder {
    plc: Plc,
}

impl G711UlawTranscoder {
    /// Create a new μ-law transcoder
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is not a valid μ-law configuration.
    pub fn new(config: &TranscoderConfig) -> Result<Self> {
        if config.format != FORMAT {
            return Err(CodecError::invalid_config(format!(
                "{} transcoder cannot handle {}",
                FORMAT, config.format
            )));
        }
        config.validate()?;

        let plc = Plc::new(config.plc.clone())?;
        debug!("Created {} transcoder", FORMAT);

        Ok(Self { plc })
    }

    /// Concealment engine for the inbound direction
    pub fn plc(&self) -> &Plc {
        &self.plc
    }
}

impl Transcoder for G711UlawTranscoder {
    fn decode(&mut self, encoded: &[u8], pcm_out: &mut [i16]) -> Result<()> {
        validate_block_pair(FORMAT, encoded.len(), pcm_out.len())?;

        let mut pcm = [0i16; BLOCK_SIZE];
        mulaw_expand_batch_table(encoded, &mut pcm)?;
        self.plc.good_frames(&pcm, pcm_out)
    }

    fn decode_gap(&mut self, pcm_out: &mut [i16]) -> Result<()> {
        validate_pcm_block(FORMAT, pcm_out)?;
        self.plc.bad_frames(pcm_out)
    }

    fn encode(&self, pcm_in: &[i16], encoded_out: &mut [u8]) -> Result<()> {
        validate_block_pair(FORMAT, encoded_out.len(), pcm_in.len())?;
        mulaw_compress_batch_table(pcm_in, encoded_out)
    }

    fn reset(&mut self) {
        self.plc.reset();
    }

    fn format(&self) -> AudioFormat {
        FORMAT
    }
}
