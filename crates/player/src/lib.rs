//! Tactus Player Module
//!
//! Playback core for a video player with a synchronized waveform scrubber
//! and amplitude-driven haptic feedback.
//!
//! # Features
//!
//! - PCM extraction from media containers (symphonia, off the interactive
//!   context)
//! - Peak-amplitude envelope reduction for waveform display and haptic
//!   triggering
//! - Transport state machine with scrub suppression
//! - Rate-limited, thresholded haptic trigger policy
//! - Async orchestration via the `tactus-core` module system

pub mod analysis;
pub mod haptics;
pub mod module;
pub mod session;
pub mod waveform;

// Re-export main types
pub use analysis::{AmplitudeEnvelope, ExtractedAudio, DEFAULT_ENVELOPE_BARS};
pub use haptics::{HapticEngine, TriggerPolicy};
pub use module::PlayerModule;
pub use session::{PlaybackSession, TransportState};
