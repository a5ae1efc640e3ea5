//! Core types and traits for the codec library
//!
//! This module defines the [`Transcoder`] contract shared by every wire
//! format, the descriptive [`CodecInfo`] record and the configuration type
//! consumed by [`crate::codecs::TranscoderFactory`].

use crate::error::{CodecError, Result};
use crate::format::AudioFormat;
use crate::plc::PlcConfig;
use std::fmt;

/// Primary trait for block transcoders
///
/// A transcoder converts one 20 ms block per call between a wire format and
/// 16-bit native PCM. Every block has a fixed size (see
/// [`Transcoder::block_size`] and [`Transcoder::encoded_block_size`]); a
/// slice of any other length is rejected with
/// [`CodecError::InvalidFrameSize`] before anything is written.
///
/// Instances are owned by exactly one channel direction. They may be moved
/// to the audio thread (`Send`) but are never shared.
pub trait Transcoder: Send {
    /// Decode one received block into PCM
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidFrameSize`] if either slice has the wrong
    /// length. `pcm_out` is left untouched in that case.
    fn decode(&mut self, encoded: &[u8], pcm_out: &mut [i16]) -> Result<()>;

    /// Produce one block of audio for a block that never arrived
    ///
    /// Loss-concealing formats synthesize a continuation of recent audio;
    /// the others emit silence.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidFrameSize`] if `pcm_out` has the wrong
    /// length.
    fn decode_gap(&mut self, pcm_out: &mut [i16]) -> Result<()>;

    /// Encode one block of PCM for transmission
    ///
    /// Encoding is stateless and never disturbs decoder state.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidFrameSize`] if either slice has the wrong
    /// length. `encoded_out` is left untouched in that case.
    fn encode(&self, pcm_in: &[i16], encoded_out: &mut [u8]) -> Result<()>;

    /// Drop all decoder history (start of a new call)
    fn reset(&mut self);

    /// Wire format handled by this transcoder
    fn format(&self) -> AudioFormat;

    /// Get transcoder information
    fn info(&self) -> CodecInfo {
        CodecInfo::for_format(self.format())
    }

    /// PCM samples per block
    fn block_size(&self) -> usize {
        self.format().block_size()
    }

    /// Encoded bytes per block
    fn encoded_block_size(&self) -> usize {
        self.format().encoded_block_size()
    }
}

/// Transcoder information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecInfo {
    /// Codec name (e.g., "ULAW", "SLIN16")
    pub name: &'static str,
    /// Wire format
    pub format: AudioFormat,
    /// IAX2 codec mask bit
    pub iax2_mask: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (always mono)
    pub channels: u8,
    /// Bitrate in bits per second
    pub bitrate: u32,
    /// Block size in PCM samples
    pub frame_size: usize,
    /// Block size in encoded bytes
    pub encoded_frame_size: usize,
    /// Whether gaps are concealed rather than silenced
    pub conceals_loss: bool,
}

impl CodecInfo {
    /// Describe the given wire format
    pub fn for_format(format: AudioFormat) -> Self {
        let encoded_frame_size = format.encoded_block_size();
        Self {
            name: format.name(),
            format,
            iax2_mask: format.mask(),
            sample_rate: format.sample_rate().hz(),
            channels: 1,
            bitrate: (encoded_frame_size * 8) as u32 * crate::format::BLOCKS_PER_SECOND,
            frame_size: format.block_size(),
            encoded_frame_size,
            conceals_loss: format.conceals_loss(),
        }
    }
}

/// Sample rate enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SampleRate {
    /// 8 kHz (narrowband)
    Rate8000,
    /// 16 kHz (wideband)
    Rate16000,
    /// 48 kHz (fullband)
    Rate48000,
    /// Custom sample rate
    Custom(u32),
}

impl SampleRate {
    /// Get the sample rate value in Hz
    pub const fn hz(self) -> u32 {
        match self {
            Self::Rate8000 => 8000,
            Self::Rate16000 => 16000,
            Self::Rate48000 => 48000,
            Self::Custom(rate) => rate,
        }
    }

    /// Create from Hz value
    pub fn from_hz(hz: u32) -> Self {
        match hz {
            8000 => Self::Rate8000,
            16000 => Self::Rate16000,
            48000 => Self::Rate48000,
            rate => Self::Custom(rate),
        }
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Hz", self.hz())
    }
}

/// Transcoder configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TranscoderConfig {
    /// Wire format
    pub format: AudioFormat,
    /// Concealment settings (ignored by formats that fill gaps with silence)
    pub plc: PlcConfig,
}

impl TranscoderConfig {
    /// Create a configuration for the given format with default PLC settings
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            plc: PlcConfig::new(Self::plc_rate(format)),
        }
    }

    /// Create G.711 μ-law configuration
    pub fn g711_ulaw() -> Self {
        Self::new(AudioFormat::G711Ulaw)
    }

    /// Create 8 kHz linear configuration
    pub fn slin8k() -> Self {
        Self::new(AudioFormat::Slin8k)
    }

    /// Create 16 kHz linear configuration
    pub fn slin16k() -> Self {
        Self::new(AudioFormat::Slin16k)
    }

    /// Create 48 kHz linear configuration
    pub fn slin48k() -> Self {
        Self::new(AudioFormat::Slin48k)
    }

    /// Set the wire format, keeping the PLC rate in step with it
    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self.plc.sample_rate = Self::plc_rate(format);
        self
    }

    /// Set concealment settings
    pub fn with_plc(mut self, plc: PlcConfig) -> Self {
        self.plc = plc;
        self
    }

    /// Set the PLC gain reduction per concealed frame
    pub fn with_attenuation_per_frame(mut self, attenuation: f32) -> Self {
        self.plc.attenuation_per_frame = attenuation;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.format.conceals_loss() {
            return Ok(());
        }

        self.plc.validate()?;

        if self.plc.sample_rate.hz() != self.format.sample_rate().hz() {
            return Err(CodecError::invalid_config(format!(
                "PLC rate {} does not match {} rate {}",
                self.plc.sample_rate,
                self.format,
                self.format.sample_rate()
            )));
        }

        Ok(())
    }

    fn plc_rate(format: AudioFormat) -> SampleRate {
        if format.conceals_loss() {
            format.sample_rate()
        } else {
            PlcConfig::default().sample_rate
        }
    }
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self::g711_ulaw()
    }
}
