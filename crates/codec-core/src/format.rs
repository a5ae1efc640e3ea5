//! IAX2 wire formats handled by the transcoders
//!
//! Each [`AudioFormat`] corresponds to one bit of the IAX2 codec mask
//! (RFC 5456 §8.7). The 48 kHz linear format uses an unofficial bit that
//! only AMP nodes understand.
//!
//! The helpers at the bottom of this module cover the small amount of codec
//! bookkeeping a channel needs before it can pick a transcoder: the
//! "A offset" preference letters carried in the CODEC_PREFS information
//! element, and the caller/callee codec assignment.

use crate::types::SampleRate;
use std::fmt;

/// G.711 μ-law
pub const IAX2_CODEC_G711_ULAW: u32 = 0x0000_0004;
/// G.711 A-law (recognized for negotiation, not transcoded)
pub const IAX2_CODEC_G711_ALAW: u32 = 0x0000_0008;
/// 8 kHz 16-bit linear, little endian
pub const IAX2_CODEC_SLIN_8K: u32 = 0x0000_0040;
/// 16 kHz 16-bit linear, little endian
pub const IAX2_CODEC_SLIN_16K: u32 = 0x0000_8000;
/// 48 kHz 16-bit linear, little endian (not official)
pub const IAX2_CODEC_SLIN_48K: u32 = 0x2000_0000;

/// Duration of one transcoder block in milliseconds
pub const BLOCK_PERIOD_MS: u32 = 20;

/// Number of blocks per second of audio
pub const BLOCKS_PER_SECOND: u32 = 1000 / BLOCK_PERIOD_MS;

/// Preference letter for bit 0 of the codec mask
const LETTER_BASE: u8 = b'B';

/// Wire formats with a transcoder implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AudioFormat {
    /// G.711 μ-law @ 8 kHz, one byte per sample
    G711Ulaw,
    /// Linear PCM @ 8 kHz, two bytes per sample
    Slin8k,
    /// Linear PCM @ 16 kHz, two bytes per sample
    Slin16k,
    /// Linear PCM @ 48 kHz, two bytes per sample
    Slin48k,
}

impl AudioFormat {
    /// Every format, in the node's order of preference
    pub const ALL: [AudioFormat; 4] = [
        AudioFormat::Slin48k,
        AudioFormat::Slin16k,
        AudioFormat::G711Ulaw,
        AudioFormat::Slin8k,
    ];

    /// IAX2 codec mask bit for this format
    pub const fn mask(self) -> u32 {
        match self {
            Self::G711Ulaw => IAX2_CODEC_G711_ULAW,
            Self::Slin8k => IAX2_CODEC_SLIN_8K,
            Self::Slin16k => IAX2_CODEC_SLIN_16K,
            Self::Slin48k => IAX2_CODEC_SLIN_48K,
        }
    }

    /// Look up a format by its (single-bit) IAX2 mask
    pub fn from_mask(mask: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.mask() == mask)
    }

    /// Short name used in configuration and logs
    pub const fn name(self) -> &'static str {
        match self {
            Self::G711Ulaw => "ULAW",
            Self::Slin8k => "SLIN",
            Self::Slin16k => "SLIN16",
            Self::Slin48k => "SLIN48",
        }
    }

    /// Look up a format by name (case-insensitive; "PCMU" is accepted for μ-law)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "ULAW" | "PCMU" | "G711U" => Some(Self::G711Ulaw),
            "SLIN" | "SLIN8" => Some(Self::Slin8k),
            "SLIN16" => Some(Self::Slin16k),
            "SLIN48" => Some(Self::Slin48k),
            _ => None,
        }
    }

    /// Natural sample rate of the format (transcoders never resample)
    pub const fn sample_rate(self) -> SampleRate {
        match self {
            Self::G711Ulaw | Self::Slin8k => SampleRate::Rate8000,
            Self::Slin16k => SampleRate::Rate16000,
            Self::Slin48k => SampleRate::Rate48000,
        }
    }

    /// PCM samples per 20 ms block
    pub const fn block_size(self) -> usize {
        (self.sample_rate().hz() / BLOCKS_PER_SECOND) as usize
    }

    /// Bytes per sample on the wire
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::G711Ulaw => 1,
            Self::Slin8k | Self::Slin16k | Self::Slin48k => 2,
        }
    }

    /// Bytes per 20 ms block on the wire
    pub const fn encoded_block_size(self) -> usize {
        self.block_size() * self.bytes_per_sample()
    }

    /// Whether `decode_gap` synthesizes audio (PLC) rather than silence
    pub const fn conceals_loss(self) -> bool {
        matches!(self, Self::G711Ulaw | Self::Slin8k)
    }

    /// CODEC_PREFS letter for this format
    pub fn letter(self) -> char {
        // Every format mask is a single bit, so this cannot fail
        codec_mask_to_letter(self.mask()).unwrap_or('?')
    }

    /// Look up a format by its CODEC_PREFS letter
    pub fn from_letter(letter: char) -> Option<Self> {
        codec_letter_to_mask(letter).and_then(Self::from_mask)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Mask with a bit set for every format that has a transcoder
pub fn supported_codecs_mask() -> u32 {
    AudioFormat::ALL
        .iter()
        .fold(0, |mask, format| mask | format.mask())
}

/// Maximum voice payload for one block of the given codec mask, in bytes
///
/// Returns 0 for codecs without a transcoder.
pub fn max_voice_frame_size(mask: u32) -> usize {
    AudioFormat::from_mask(mask).map_or(0, AudioFormat::encoded_block_size)
}

/// Convert a CODEC_PREFS letter ("A offset") to a codec mask
pub fn codec_letter_to_mask(letter: char) -> Option<u32> {
    if !letter.is_ascii() {
        return None;
    }
    let offset = (letter as u8).checked_sub(LETTER_BASE)?;
    if offset < 32 {
        Some(1u32 << offset)
    } else {
        None
    }
}

/// Convert a single-bit codec mask to its CODEC_PREFS letter
pub fn codec_mask_to_letter(mask: u32) -> Option<char> {
    if mask.count_ones() != 1 {
        return None;
    }
    Some((LETTER_BASE + mask.trailing_zeros() as u8) as char)
}

/// Parse the CODEC_PREFS string into codec masks in order of preference
///
/// Parsing stops at the first NUL; letters that do not map to a codec are
/// skipped.
pub fn parse_codec_prefs(prefs: &str) -> Vec<u32> {
    prefs
        .chars()
        .take_while(|&c| c != '\0')
        .filter_map(codec_letter_to_mask)
        .collect()
}

/// Render codec masks as a CODEC_PREFS string
pub fn format_codec_prefs(codecs: &[u32]) -> String {
    codecs
        .iter()
        .filter_map(|&mask| codec_mask_to_letter(mask))
        .collect()
}

/// Decide which codec a call should use
///
/// Only codecs present in both capability masks are candidates. The
/// caller's preference list has priority, then the single codec the caller
/// asked for, then the callee's preference list. If none of those lands on
/// a shared codec, the lowest shared bit is used.
///
/// Returns `None` when the two sides share no codec.
pub fn assign_codec(
    caller_capability: u32,
    caller_desire: u32,
    caller_prefs: &[u32],
    callee_capability: u32,
    callee_prefs: &[u32],
) -> Option<u32> {
    let common = caller_capability & callee_capability;
    if common == 0 {
        return None;
    }

    let shared = |mask: u32| mask.count_ones() == 1 && common & mask != 0;

    caller_prefs
        .iter()
        .copied()
        .find(|&mask| shared(mask))
        .or_else(|| shared(caller_desire).then_some(caller_desire))
        .or_else(|| callee_prefs.iter().copied().find(|&mask| shared(mask)))
        .or(Some(common & common.wrapping_neg()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_size_table() {
        assert_eq!(AudioFormat::G711Ulaw.block_size(), 160);
        assert_eq!(AudioFormat::G711Ulaw.encoded_block_size(), 160);
        assert_eq!(AudioFormat::Slin8k.block_size(), 160);
        assert_eq!(AudioFormat::Slin8k.encoded_block_size(), 320);
        assert_eq!(AudioFormat::Slin16k.block_size(), 320);
        assert_eq!(AudioFormat::Slin16k.encoded_block_size(), 640);
        assert_eq!(AudioFormat::Slin48k.block_size(), 960);
        assert_eq!(AudioFormat::Slin48k.encoded_block_size(), 1920);
    }

    #[test]
    fn test_mask_lookup() {
        for format in AudioFormat::ALL {
            assert_eq!(AudioFormat::from_mask(format.mask()), Some(format));
        }
        assert_eq!(AudioFormat::from_mask(IAX2_CODEC_G711_ALAW), None);
        assert_eq!(AudioFormat::from_mask(0), None);
        assert_eq!(max_voice_frame_size(IAX2_CODEC_SLIN_16K), 640);
        assert_eq!(max_voice_frame_size(IAX2_CODEC_G711_ALAW), 0);
    }

    #[test]
    fn test_name_lookup() {
        assert_eq!(AudioFormat::from_name("pcmu"), Some(AudioFormat::G711Ulaw));
        assert_eq!(AudioFormat::from_name("Slin48"), Some(AudioFormat::Slin48k));
        assert_eq!(AudioFormat::from_name("GSM"), None);
        assert_eq!(AudioFormat::Slin16k.to_string(), "SLIN16");
    }

    #[test]
    fn test_codec_letters() {
        assert_eq!(codec_letter_to_mask('D'), Some(IAX2_CODEC_G711_ULAW));
        assert_eq!(codec_mask_to_letter(IAX2_CODEC_G711_ULAW), Some('D'));
        assert_eq!(codec_letter_to_mask('E'), Some(IAX2_CODEC_G711_ALAW));
        assert_eq!(codec_letter_to_mask('H'), Some(IAX2_CODEC_SLIN_8K));
        assert_eq!(AudioFormat::Slin16k.letter(), 'Q');
        assert_eq!(AudioFormat::from_letter('D'), Some(AudioFormat::G711Ulaw));

        assert_eq!(codec_letter_to_mask('A'), None);
        assert_eq!(codec_letter_to_mask('~'), None);
        assert_eq!(codec_mask_to_letter(0), None);
        assert_eq!(codec_mask_to_letter(0x0C), None);
    }

    #[test]
    fn test_parse_codec_prefs() {
        let prefs = parse_codec_prefs("EDH");
        assert_eq!(
            prefs,
            vec![IAX2_CODEC_G711_ALAW, IAX2_CODEC_G711_ULAW, IAX2_CODEC_SLIN_8K]
        );
        assert_eq!(format_codec_prefs(&prefs), "EDH");

        assert_eq!(parse_codec_prefs("D\0H"), vec![IAX2_CODEC_G711_ULAW]);
        assert!(parse_codec_prefs("").is_empty());
    }

    #[test]
    fn test_assign_codec_caller_prefs_win() {
        // The only capability the two sides share is μ-law
        let caller_prefs = [IAX2_CODEC_SLIN_8K, IAX2_CODEC_G711_ULAW];
        let caller_capability = IAX2_CODEC_SLIN_8K | IAX2_CODEC_G711_ULAW;
        let callee_prefs = [IAX2_CODEC_SLIN_16K];
        let callee_capability = IAX2_CODEC_G711_ULAW | IAX2_CODEC_SLIN_16K;

        assert_eq!(
            assign_codec(caller_capability, 0, &caller_prefs, callee_capability, &callee_prefs),
            Some(IAX2_CODEC_G711_ULAW)
        );
    }

    #[test]
    fn test_assign_codec_fallbacks() {
        let both = IAX2_CODEC_SLIN_16K | IAX2_CODEC_G711_ULAW;

        // Caller desire beats callee prefs
        assert_eq!(
            assign_codec(both, IAX2_CODEC_SLIN_16K, &[], both, &[IAX2_CODEC_G711_ULAW]),
            Some(IAX2_CODEC_SLIN_16K)
        );
        // Callee prefs used when the caller expresses nothing usable
        assert_eq!(
            assign_codec(both, 0, &[IAX2_CODEC_G711_ALAW], both, &[IAX2_CODEC_SLIN_16K]),
            Some(IAX2_CODEC_SLIN_16K)
        );
        // Lowest shared bit as a last resort
        assert_eq!(assign_codec(both, 0, &[], both, &[]), Some(IAX2_CODEC_G711_ULAW));
        // Nothing in common
        assert_eq!(
            assign_codec(IAX2_CODEC_SLIN_8K, 0, &[], IAX2_CODEC_SLIN_16K, &[]),
            None
        );
    }

    #[test]
    fn test_supported_mask() {
        let mask = supported_codecs_mask();
        assert_ne!(mask & IAX2_CODEC_G711_ULAW, 0);
        assert_ne!(mask & IAX2_CODEC_SLIN_48K, 0);
        assert_eq!(mask & IAX2_CODEC_G711_ALAW, 0);
    }
}
