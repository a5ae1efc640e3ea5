//! Transcoder implementations and factory

use crate::error::{CodecError, Result};
use crate::format::{AudioFormat, codec_letter_to_mask};
use crate::types::{Transcoder, TranscoderConfig};
use std::collections::HashMap;
use tracing::{debug, warn};

// Transcoder implementations
#[cfg(feature = "g711")]
pub mod g711;

#[cfg(feature = "slin")]
pub mod slin;

/// Identifier of the channel a registered transcoder belongs to
pub type ChannelId = u32;

/// Transcoder factory for creating transcoder instances
pub struct TranscoderFactory;

impl TranscoderFactory {
    /// Create a transcoder instance from configuration
    pub fn create(config: TranscoderConfig) -> Result<Box<dyn Transcoder>> {
        // Validate configuration first
        config.validate()?;

        #[allow(unreachable_patterns)]
        let transcoder: Box<dyn Transcoder> = match config.format {
            #[cfg(feature = "g711")]
            AudioFormat::G711Ulaw => Box::new(g711::G711UlawTranscoder::new(&config)?),

            #[cfg(feature = "slin")]
            AudioFormat::Slin8k => Box::new(slin::Slin8kTranscoder::new(&config)?),

            #[cfg(feature = "slin")]
            AudioFormat::Slin16k | AudioFormat::Slin48k => {
                Box::new(slin::SlinTranscoder::new(&config)?)
            }

            format => {
                warn!("{} transcoder not enabled in build features", format);
                return Err(CodecError::feature_not_enabled(Self::feature_for(format)));
            }
        };

        debug!("Factory created {} transcoder", config.format);
        Ok(transcoder)
    }

    /// Create a transcoder by name ("ULAW", "SLIN", "SLIN16", "SLIN48")
    pub fn create_by_name(name: &str, config: TranscoderConfig) -> Result<Box<dyn Transcoder>> {
        let format =
            AudioFormat::from_name(name).ok_or_else(|| CodecError::unsupported_codec(name))?;
        Self::create(config.with_format(format))
    }

    /// Create a transcoder by IAX2 codec mask
    pub fn create_by_mask(mask: u32, config: TranscoderConfig) -> Result<Box<dyn Transcoder>> {
        let format = AudioFormat::from_mask(mask)
            .ok_or_else(|| CodecError::unsupported_codec(format!("mask 0x{:08x}", mask)))?;
        Self::create(config.with_format(format))
    }

    /// Create a transcoder by CODEC_PREFS letter
    pub fn create_by_letter(letter: char, config: TranscoderConfig) -> Result<Box<dyn Transcoder>> {
        let mask = codec_letter_to_mask(letter)
            .ok_or_else(|| CodecError::unsupported_codec(format!("letter '{}'", letter)))?;
        Self::create_by_mask(mask, config)
    }

    /// Get all formats this build can transcode
    pub fn supported_formats() -> Vec<AudioFormat> {
        AudioFormat::ALL
            .into_iter()
            .filter(|&format| Self::is_supported(format))
            .collect()
    }

    /// Mask with a bit set for every format this build can transcode
    pub fn supported_mask() -> u32 {
        Self::supported_formats()
            .iter()
            .fold(0, |mask, format| mask | format.mask())
    }

    /// Check if a format is supported by this build
    pub fn is_supported(format: AudioFormat) -> bool {
        match format {
            AudioFormat::G711Ulaw => cfg!(feature = "g711"),
            AudioFormat::Slin8k | AudioFormat::Slin16k | AudioFormat::Slin48k => {
                cfg!(feature = "slin")
            }
        }
    }

    /// Check if a format name is supported by this build
    pub fn is_supported_name(name: &str) -> bool {
        AudioFormat::from_name(name).is_some_and(Self::is_supported)
    }

    fn feature_for(format: AudioFormat) -> &'static str {
        match format {
            AudioFormat::G711Ulaw => "g711",
            AudioFormat::Slin8k | AudioFormat::Slin16k | AudioFormat::Slin48k => "slin",
        }
    }
}

/// Transcoder registry holding one transcoder per channel
pub struct TranscoderRegistry {
    transcoders: HashMap<ChannelId, Box<dyn Transcoder>>,
}

impl TranscoderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            transcoders: HashMap::new(),
        }
    }

    /// Register a transcoder for a channel, returning the one it replaces
    pub fn register(
        &mut self,
        channel: ChannelId,
        transcoder: Box<dyn Transcoder>,
    ) -> Option<Box<dyn Transcoder>> {
        debug!(
            "Registering {} transcoder for channel {}",
            transcoder.format(),
            channel
        );
        self.transcoders.insert(channel, transcoder)
    }

    /// Get a channel's transcoder
    pub fn get(&self, channel: ChannelId) -> Option<&dyn Transcoder> {
        self.transcoders.get(&channel).map(|t| t.as_ref())
    }

    /// Get a channel's transcoder mutably
    pub fn get_mut(&mut self, channel: ChannelId) -> Option<&mut Box<dyn Transcoder>> {
        self.transcoders.get_mut(&channel)
    }

    /// Remove a channel's transcoder
    pub fn remove(&mut self, channel: ChannelId) -> Option<Box<dyn Transcoder>> {
        self.transcoders.remove(&channel)
    }

    /// List all channels with a transcoder
    pub fn channels(&self) -> Vec<ChannelId> {
        self.transcoders.keys().copied().collect()
    }

    /// Reset every registered transcoder
    pub fn reset_all(&mut self) {
        for transcoder in self.transcoders.values_mut() {
            transcoder.reset();
        }
    }

    /// Get the count of registered transcoders
    pub fn len(&self) -> usize {
        self.transcoders.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.transcoders.is_empty()
    }

    /// Clear all registered transcoders
    pub fn clear(&mut self) {
        self.transcoders.clear();
    }
}

impl Default for TranscoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
