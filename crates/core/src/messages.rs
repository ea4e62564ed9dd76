//! Command and event vocabulary between the shell and the player module.

use std::path::PathBuf;

use crate::haptic::ActuatorSignal;
use crate::media::AssetInfo;

/// Commands sent from the shell (UI) to the player module.
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    // Asset management
    /// Load a new media asset, replacing any live session.
    LoadAsset { path: PathBuf },

    // Playback
    /// Start playback.
    Play,
    /// Pause playback.
    Pause,
    /// Toggle play/pause.
    PlayPause,
    /// Seek to an absolute position in seconds.
    Seek { seconds: f64 },
    /// Restart a finished asset from the beginning.
    Replay,

    // Scrubbing
    /// An interactive scrub gesture began.
    BeginScrub,
    /// Scrub position update (normalized progress, 0.0-1.0).
    ScrubTo { progress: f64 },
    /// The scrub gesture ended; playback resumes if it was playing before.
    EndScrub,

    // Haptics
    /// Enable or disable haptic pulses.
    SetHapticsEnabled { enabled: bool },
    /// Forward an asynchronous actuator notification from the platform.
    Actuator(ActuatorSignal),

    /// Shut the module down.
    Shutdown,
}

/// Events emitted by the player module.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    // Asset lifecycle
    /// An asset was resolved and a fresh session created.
    AssetLoaded { info: AssetInfo },
    /// The asset could not be loaded; the session has no envelope and
    /// haptics stay silent.
    AssetFailed { message: String },

    // Envelope analysis
    /// Background analysis progress (0.0-1.0).
    EnvelopeProgress { fraction: f32 },
    /// The amplitude envelope was adopted by the session.
    EnvelopeReady { bars: Vec<f32> },

    // Playback
    /// Transport state changed.
    TransportChanged {
        playing: bool,
        position_seconds: f64,
    },
    /// Periodic position update while playing.
    PositionUpdated {
        position_seconds: f64,
        progress: f64,
    },
    /// Playback reached the end of the asset.
    Finished,

    // Haptics
    /// A haptic pulse was dispatched to the actuator.
    PulseFired { intensity: f32, sharpness: f32 },
    /// Haptics became unavailable for the remainder of the session.
    HapticsUnavailable { message: String },

    /// A non-fatal error occurred.
    Error { message: String },
}
