//! Error handling for the codec library
//!
//! Every transcoder and PLC operation reports failure through [`CodecError`].
//! A failed call never leaves a half-written output block behind: lengths are
//! validated before anything is written, so callers can safely substitute
//! silence or repeat their previous block.

#![allow(missing_docs)]

use std::fmt;
use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Error type for transcoder and PLC operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Invalid codec configuration
    #[error("Invalid codec configuration: {details}")]
    InvalidConfig { details: String },

    /// Unsupported codec type
    #[error("Unsupported codec type: {codec_type}")]
    UnsupportedCodec { codec_type: String },

    /// Block length does not match the fixed size of the transcoder
    #[error("Invalid frame size: expected {expected}, got {actual}")]
    InvalidFrameSize { expected: usize, actual: usize },

    /// Invalid sample rate
    #[error("Invalid sample rate: {rate}Hz (supported: {supported:?})")]
    InvalidSampleRate { rate: u32, supported: Vec<u32> },

    /// Frame operation attempted before the PLC engine was configured
    #[error("PLC engine not configured: call configure() with a sample rate first")]
    NotConfigured,

    /// Feature not enabled
    #[error("Feature not enabled: {feature} (enable with --features {feature})")]
    FeatureNotEnabled { feature: String },
}

impl CodecError {
    /// Create a new invalid configuration error
    pub fn invalid_config(details: impl Into<String>) -> Self {
        Self::InvalidConfig {
            details: details.into(),
        }
    }

    /// Create a new unsupported codec error
    pub fn unsupported_codec(codec_type: impl Into<String>) -> Self {
        Self::UnsupportedCodec {
            codec_type: codec_type.into(),
        }
    }

    /// Create a new frame size mismatch error
    pub fn frame_size(expected: usize, actual: usize) -> Self {
        Self::InvalidFrameSize { expected, actual }
    }

    /// Create a new feature not enabled error
    pub fn feature_not_enabled(feature: impl Into<String>) -> Self {
        Self::FeatureNotEnabled {
            feature: feature.into(),
        }
    }

    /// Check if this error is recoverable
    ///
    /// A recoverable error only affects the current tick; the caller can
    /// retry with correctly sized buffers on the next one.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidFrameSize { .. } | Self::NotConfigured => true,

            Self::InvalidConfig { .. }
            | Self::UnsupportedCodec { .. }
            | Self::InvalidSampleRate { .. }
            | Self::FeatureNotEnabled { .. } => false,
        }
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig { .. }
            | Self::UnsupportedCodec { .. }
            | Self::InvalidSampleRate { .. }
            | Self::FeatureNotEnabled { .. } => ErrorCategory::Configuration,

            Self::InvalidFrameSize { .. } => ErrorCategory::Contract,

            Self::NotConfigured => ErrorCategory::Initialization,
        }
    }
}

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Configuration and parameter errors
    Configuration,
    /// Caller passed a buffer of the wrong size
    Contract,
    /// Engine used before it was set up
    Initialization,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Contract => write!(f, "Contract"),
            Self::Initialization => write!(f, "Initialization"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CodecError::invalid_config("test message");
        assert!(matches!(err, CodecError::InvalidConfig { .. }));
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_error_recoverability() {
        assert!(CodecError::frame_size(160, 80).is_recoverable());
        assert!(CodecError::NotConfigured.is_recoverable());
        assert!(!CodecError::invalid_config("test").is_recoverable());
        assert!(!CodecError::unsupported_codec("GSM").is_recoverable());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            CodecError::frame_size(160, 161).category(),
            ErrorCategory::Contract
        );
        assert_eq!(
            CodecError::NotConfigured.category(),
            ErrorCategory::Initialization
        );
        assert_eq!(
            CodecError::feature_not_enabled("g711").category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn test_error_display() {
        let err = CodecError::InvalidFrameSize {
            expected: 160,
            actual: 80,
        };
        let display = format!("{}", err);
        assert!(display.contains("expected 160"));
        assert!(display.contains("got 80"));

        let err = CodecError::InvalidSampleRate {
            rate: 44100,
            supported: vec![8000, 16000],
        };
        assert!(err.to_string().contains("44100Hz"));
        assert_eq!(ErrorCategory::Contract.to_string(), "Contract");
    }
}
