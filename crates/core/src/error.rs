//! Error taxonomy for the playback core.
//!
//! No variant here is fatal: asset and decode failures degrade to an empty
//! envelope, haptic failures disable pulses for the session, and seek
//! failures leave the playback position unchanged.

use thiserror::Error;

/// Failures opening or inspecting a media asset.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The file could not be opened or probed at all.
    #[error("unreadable media file: {0}")]
    Unreadable(String),
    /// The container holds no decodable audio stream.
    #[error("no audio track in asset")]
    NoAudioTrack,
    /// A decoder could not be instantiated for the audio stream.
    #[error("decoder open failed: {0}")]
    DecoderOpen(String),
}

/// Failures while reading or decoding an audio stream mid-flight.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A corrupt packet or buffer was encountered. Extraction aborts;
    /// partial output is never surfaced.
    #[error("corrupt audio stream: {0}")]
    CorruptStream(String),
    /// An I/O error other than a clean end-of-stream.
    #[error("read failed while decoding: {0}")]
    Io(String),
}

/// Any failure produced by the extraction pipeline.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Failures from the haptic actuator.
#[derive(Debug, Error)]
pub enum HapticError {
    /// The device has no haptic hardware.
    #[error("haptics not supported on this device")]
    Unsupported,
    /// The engine refused to start.
    #[error("haptic engine failed to start: {0}")]
    EngineStart(String),
    /// A pulse was dispatched but playback failed.
    #[error("haptic pulse playback failed: {0}")]
    Playback(String),
}

/// A seek request the media player could not honor.
///
/// Surfaced by leaving the playback position unchanged; one attempt per
/// user action, no retries.
#[derive(Debug, Error)]
#[error("seek to {target_seconds:.2}s failed: {reason}")]
pub struct SeekError {
    pub target_seconds: f64,
    pub reason: String,
}

impl SeekError {
    pub fn new(target_seconds: f64, reason: impl Into<String>) -> Self {
        Self {
            target_seconds,
            reason: reason.into(),
        }
    }
}
