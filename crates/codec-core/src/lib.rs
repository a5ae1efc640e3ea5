//! # AMP Codec-Core: Audio Transcoding and Loss Concealment
//!
//! This library provides the audio core of an AllStarLink-style voice
//! gateway. It converts fixed 20 ms blocks between the IAX2 wire formats
//! and 16-bit native PCM, and conceals lost blocks on the narrowband legs.
//!
//! ## Formats
//!
//! - **G.711 μ-law** @ 8 kHz: ITU-T compliant companding, gaps concealed
//! - **SLIN** @ 8 kHz: 16-bit little-endian linear, gaps concealed
//! - **SLIN16** / **SLIN48**: 16-bit little-endian linear, gaps silenced
//!
//! ## Real-time behavior
//!
//! - **Fixed blocks**: every call handles exactly one block; a slice of any
//!   other length is rejected before anything is written
//! - **No per-tick allocation**: all working buffers live on the stack or
//!   inside the transcoder
//! - **Lookup tables**: μ-law uses pre-computed tables on the hot path
//!
//! ## Usage
//!
//! ```rust
//! use amp_codec_core::{Transcoder, TranscoderConfig, TranscoderFactory};
//!
//! // Create a G.711 μ-law transcoder
//! let mut transcoder = TranscoderFactory::create(TranscoderConfig::g711_ulaw())?;
//!
//! // Encode one 20 ms block
//! let samples = [0i16; 160];
//! let mut wire = [0u8; 160];
//! transcoder.encode(&samples, &mut wire)?;
//!
//! // Decode it, then conceal a lost block
//! let mut pcm = [0i16; 160];
//! transcoder.decode(&wire, &mut pcm)?;
//! transcoder.decode_gap(&mut pcm)?;
//! # Ok::<(), amp_codec_core::CodecError>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `g711`: G.711 μ-law transcoder (enabled by default)
//! - `slin`: linear PCM transcoders (enabled by default)
//! - `serde`: `Serialize`/`Deserialize` for configuration types

#![deny(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod codecs;
pub mod error;
pub mod format;
pub mod plc;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use codecs::{ChannelId, TranscoderFactory, TranscoderRegistry};
pub use error::{CodecError, ErrorCategory, Result};
pub use format::{AudioFormat, assign_codec, parse_codec_prefs};
pub use plc::{Plc, PlcConfig, PlcState, PlcStats};
pub use types::{CodecInfo, SampleRate, Transcoder, TranscoderConfig};

use tracing_subscriber::EnvFilter;

/// Version information for the codec library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Names of the formats compiled into this build
pub const SUPPORTED_FORMATS: &[&str] = &[
    #[cfg(feature = "g711")]
    "ULAW",
    #[cfg(feature = "slin")]
    "SLIN",
    #[cfg(feature = "slin")]
    "SLIN16",
    #[cfg(feature = "slin")]
    "SLIN48",
];

/// Initialize the codec library
///
/// Installs a `tracing` subscriber filtered by `RUST_LOG` if none is set
/// and builds the μ-law lookup tables so the first audio tick does not pay
/// for them. It's safe to call multiple times.
pub fn init() -> Result<()> {
    // Initialize logging if not already done
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    #[cfg(feature = "g711")]
    codecs::g711::init_tables();

    tracing::info!("Codec-Core v{} initialized", VERSION);
    tracing::info!("Supported formats: {:?}", SUPPORTED_FORMATS);

    Ok(())
}

/// Get library information
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        supported_formats: SUPPORTED_FORMATS.to_vec(),
        supported_mask: TranscoderFactory::supported_mask(),
    }
}

/// Library information structure
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    /// Library version
    pub version: &'static str,
    /// List of supported format names
    pub supported_formats: Vec<&'static str>,
    /// IAX2 codec mask of the supported formats
    pub supported_mask: u32,
}
