//! Playback session state and transport state machine.
//!
//! A session is created when an asset loads and replaced wholesale when the
//! asset changes. All mutation happens on the player module's run loop; the
//! shell only reads snapshots.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tactus_core::AssetInfo;

use crate::analysis::AmplitudeEnvelope;

/// Transport state of the playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportState {
    /// No asset loaded.
    #[default]
    Idle,
    /// Asset metadata resolved, ready to play.
    Loaded,
    /// Actively playing.
    Playing,
    /// Paused.
    Paused,
    /// Playback reached the end of the asset.
    Finished,
}

impl TransportState {
    /// Returns true if playback is actively advancing.
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Returns true if an asset is loaded.
    pub fn has_asset(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// State of the live playback session.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    /// Asset identity; incremented on every load so in-flight analysis
    /// results for a previous asset can be recognized and discarded.
    pub generation: u64,
    /// Currently loaded asset.
    pub asset: Option<AssetInfo>,
    /// Current transport state.
    pub state: TransportState,
    /// Current position in seconds.
    pub position_seconds: f64,
    /// Asset duration in seconds.
    pub duration_seconds: f64,
    /// Amplitude envelope of the asset's audio (empty until analyzed, and
    /// empty forever for assets without decodable audio).
    pub envelope: AmplitudeEnvelope,
    /// An interactive scrub gesture is in progress; player clock ticks are
    /// suppressed while set.
    pub scrubbing: bool,
    /// Wall-clock timestamp of the last emitted haptic pulse.
    pub last_pulse_at: Option<Instant>,
    /// Playback was active when the current scrub began.
    resume_after_scrub: bool,
}

impl PlaybackSession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self {
            generation: 0,
            asset: None,
            state: TransportState::Idle,
            position_seconds: 0.0,
            duration_seconds: 0.0,
            envelope: AmplitudeEnvelope::default(),
            scrubbing: false,
            last_pulse_at: None,
            resume_after_scrub: false,
        }
    }

    /// Load a new asset, resetting the whole session under a new
    /// generation.
    pub fn load_asset(&mut self, info: AssetInfo) {
        self.generation += 1;
        self.duration_seconds = info.duration_seconds;
        self.asset = Some(info);
        self.state = TransportState::Loaded;
        self.position_seconds = 0.0;
        self.envelope = AmplitudeEnvelope::default();
        self.scrubbing = false;
        self.last_pulse_at = None;
        self.resume_after_scrub = false;
    }

    /// Clear the session back to idle (teardown / asset removal).
    pub fn clear(&mut self) {
        self.generation += 1;
        self.asset = None;
        self.state = TransportState::Idle;
        self.position_seconds = 0.0;
        self.duration_seconds = 0.0;
        self.envelope = AmplitudeEnvelope::default();
        self.scrubbing = false;
        self.last_pulse_at = None;
        self.resume_after_scrub = false;
    }

    /// Adopt a freshly built envelope as one unit.
    pub fn adopt_envelope(&mut self, envelope: AmplitudeEnvelope) {
        self.envelope = envelope;
    }

    /// Request playback. Returns true if the state changed.
    pub fn play(&mut self) -> bool {
        match self.state {
            TransportState::Loaded | TransportState::Paused => {
                self.state = TransportState::Playing;
                true
            }
            _ => false,
        }
    }

    /// Request pause. Returns true if the state changed.
    pub fn pause(&mut self) -> bool {
        if self.state == TransportState::Playing {
            self.state = TransportState::Paused;
            self.last_pulse_at = None;
            true
        } else {
            false
        }
    }

    /// Restart a finished session from the beginning. Returns true if the
    /// state changed.
    pub fn replay(&mut self) -> bool {
        if self.state == TransportState::Finished {
            self.position_seconds = 0.0;
            self.state = TransportState::Playing;
            true
        } else {
            false
        }
    }

    /// Mark playback as finished.
    pub fn finish(&mut self) {
        self.state = TransportState::Finished;
        self.position_seconds = self.duration_seconds;
        self.last_pulse_at = None;
    }

    /// An interactive scrub began. Playback auto-pauses; whether it was
    /// playing is remembered so [`end_scrub`](Self::end_scrub) can resume.
    pub fn begin_scrub(&mut self) {
        if self.scrubbing {
            return;
        }
        self.scrubbing = true;
        if self.state == TransportState::Playing {
            self.resume_after_scrub = true;
            self.state = TransportState::Paused;
            self.last_pulse_at = None;
        } else {
            self.resume_after_scrub = false;
        }
    }

    /// Scrub-driven position update (normalized progress).
    pub fn scrub_to(&mut self, progress: f64) {
        if self.scrubbing {
            self.position_seconds = progress.clamp(0.0, 1.0) * self.duration_seconds;
        }
    }

    /// The scrub gesture ended. Returns true if playback should resume.
    pub fn end_scrub(&mut self) -> bool {
        if !self.scrubbing {
            return false;
        }
        self.scrubbing = false;
        let resume = self.resume_after_scrub;
        self.resume_after_scrub = false;
        if resume && self.state == TransportState::Paused {
            self.state = TransportState::Playing;
        }
        resume
    }

    /// Apply a player clock tick. Returns true when playback just reached
    /// the end of the asset (within `end_epsilon` seconds).
    ///
    /// Ticks are ignored while scrubbing or when not playing.
    pub fn apply_tick(&mut self, player_time: f64, end_epsilon: f64) -> bool {
        if self.scrubbing || self.state != TransportState::Playing {
            return false;
        }
        self.position_seconds = player_time.clamp(0.0, self.duration_seconds.max(0.0));
        if self.duration_seconds > 0.0
            && self.position_seconds >= self.duration_seconds - end_epsilon
        {
            self.finish();
            return true;
        }
        false
    }

    /// Set the position after a successful seek.
    pub fn seek_to(&mut self, seconds: f64) {
        self.position_seconds = seconds.clamp(0.0, self.duration_seconds.max(0.0));
    }

    /// Normalized playback progress (0.0-1.0).
    pub fn progress(&self) -> f64 {
        if self.duration_seconds <= 0.0 {
            return 0.0;
        }
        (self.position_seconds / self.duration_seconds).clamp(0.0, 1.0)
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}
