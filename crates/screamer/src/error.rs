use thiserror::Error;

use crate::dma::{Direction, DmaChannelId};

pub type Result<T> = std::result::Result<T, ScreamerError>;

#[derive(Debug, Error)]
pub enum ScreamerError {
    #[error("dma binding failed: {0}")]
    Binding(#[from] BindingError),

    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("host audio error: {0}")]
    Audio(#[from] AudioError),
}

/// Invalid configuration requests.
///
/// The register path never surfaces these to the guest; it clamps instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("unsupported sample rate {requested} Hz (nearest supported is {nearest} Hz)")]
    UnsupportedSampleRate { requested: u32, nearest: u32 },

    #[error("threshold {0} exceeds ring capacity")]
    ThresholdTooLarge(u32),
}

/// DMA registration failures. These abort device setup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("dma channels already registered for this engine")]
    AlreadyRegistered,

    #[error("cannot register dma while a direction is enabled")]
    EngineActive,

    #[error("transmit and receive both name dma channel {0}")]
    SameChannel(DmaChannelId),

    #[error("dma channel {0} is outside the controller's channel range")]
    InvalidChannel(DmaChannelId),

    #[error("no dma channel bound for {0:?}")]
    Unbound(Direction),
}

/// Errors reported by a host audio backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AudioError {
    #[error("host audio backend cannot open a {channels}-channel {format:?} voice")]
    UnsupportedFormat {
        format: crate::sink::SampleFormat,
        channels: u8,
    },

    #[error("host audio backend has no free voices")]
    NoVoice,
}
