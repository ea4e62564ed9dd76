//! Haptic trigger policy and actuator engine.
//!
//! The policy turns envelope lookups into rate-limited, thresholded pulse
//! requests; the engine owns the actuator and latches itself unavailable on
//! failure instead of retrying per pulse.

use std::time::{Duration, Instant};

use tactus_core::{ActuatorSignal, HapticActuator, HapticPulse, Settings};

use crate::session::{PlaybackSession, TransportState};

/// Decides whether the current playback position warrants a haptic pulse.
///
/// Pure apart from the session's last-pulse timestamp; `now` is passed in
/// so the spacing rule is deterministic under test.
#[derive(Debug, Clone)]
pub struct TriggerPolicy {
    min_interval: Duration,
    amplitude_floor: f32,
    intensity_floor: f32,
    sharpness_offset: f32,
    sharpness_cap: f32,
}

impl TriggerPolicy {
    /// Build a policy from the configured settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            min_interval: Duration::from_millis(settings.min_pulse_interval_ms),
            amplitude_floor: settings.amplitude_floor,
            intensity_floor: settings.intensity_floor,
            sharpness_offset: settings.sharpness_offset,
            sharpness_cap: settings.sharpness_cap,
        }
    }

    /// Evaluate the policy at `now`.
    ///
    /// Returns a pulse request and stamps the session's last-pulse
    /// timestamp, or `None` when any gate suppresses the pulse: actuator
    /// unavailable, scrub in progress, not playing, no duration, empty
    /// envelope, minimum spacing not yet elapsed, or amplitude at the
    /// looked-up bar too quiet to matter.
    pub fn evaluate(
        &self,
        session: &mut PlaybackSession,
        haptics_available: bool,
        now: Instant,
    ) -> Option<HapticPulse> {
        if !haptics_available || session.scrubbing {
            return None;
        }
        if session.state != TransportState::Playing {
            return None;
        }
        if session.duration_seconds <= 0.0 || session.envelope.is_empty() {
            return None;
        }

        if let Some(last) = session.last_pulse_at {
            if now.duration_since(last) < self.min_interval {
                return None;
            }
        }

        let value = session.envelope.value_at_progress(session.progress())?;
        if value <= self.amplitude_floor {
            return None;
        }

        let intensity = value.clamp(self.intensity_floor, 1.0);
        let sharpness = (intensity + self.sharpness_offset).min(self.sharpness_cap);

        session.last_pulse_at = Some(now);
        Some(HapticPulse::new(intensity, sharpness))
    }
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Owns the haptic actuator and tracks its availability.
///
/// A start failure or a failed pulse latches the engine unavailable for the
/// rest of the session; re-probing happens only on the next explicit start
/// (new playback start or a system reset signal).
pub struct HapticEngine {
    actuator: Box<dyn HapticActuator>,
    available: bool,
}

impl HapticEngine {
    /// Create an engine around an actuator. Unavailable until started.
    pub fn new(actuator: Box<dyn HapticActuator>) -> Self {
        Self {
            actuator,
            available: false,
        }
    }

    /// Probe and start the actuator. Returns availability.
    pub fn start(&mut self) -> bool {
        match self.actuator.start() {
            Ok(()) => {
                self.available = true;
                log::debug!("Haptic engine started");
            }
            Err(e) => {
                self.available = false;
                log::warn!("Haptic engine unavailable: {}", e);
            }
        }
        self.available
    }

    /// Start only when not already available.
    pub fn ensure_started(&mut self) -> bool {
        if !self.available {
            self.start();
        }
        self.available
    }

    /// Stop the actuator. The engine stays unavailable until the next
    /// start.
    pub fn stop(&mut self) {
        self.actuator.stop();
        self.available = false;
    }

    /// Whether pulses can currently be dispatched.
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Dispatch a pulse. A playback failure latches the engine
    /// unavailable and returns false.
    pub fn fire(&mut self, pulse: HapticPulse) -> bool {
        if !self.available {
            return false;
        }
        match self.actuator.fire_pulse(pulse) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Haptic pulse failed, disabling haptics for session: {}", e);
                self.available = false;
                false
            }
        }
    }

    /// React to an asynchronous hardware notification.
    ///
    /// `Reset` re-probes the actuator; `Stopped` leaves the engine down
    /// until the next explicit start. The caller clears the session's
    /// pulse timestamp in both cases.
    pub fn handle_signal(&mut self, signal: ActuatorSignal) {
        match signal {
            ActuatorSignal::Reset => {
                log::info!("Haptic engine reset by system, re-probing");
                self.available = false;
                self.start();
            }
            ActuatorSignal::Stopped => {
                log::info!("Haptic engine stopped by system");
                self.available = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tactus_core::{AssetInfo, HapticError};

    use super::*;
    use crate::analysis::AmplitudeEnvelope;

    /// Actuator stub with scriptable failures.
    struct StubActuator {
        fail_start: bool,
        fail_pulse: bool,
        fired: Arc<AtomicUsize>,
    }

    impl StubActuator {
        fn new() -> (Self, Arc<AtomicUsize>) {
            let fired = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    fail_start: false,
                    fail_pulse: false,
                    fired: Arc::clone(&fired),
                },
                fired,
            )
        }
    }

    impl HapticActuator for StubActuator {
        fn start(&mut self) -> Result<(), HapticError> {
            if self.fail_start {
                Err(HapticError::EngineStart("stub refused".into()))
            } else {
                Ok(())
            }
        }

        fn stop(&mut self) {}

        fn fire_pulse(&mut self, _pulse: HapticPulse) -> Result<(), HapticError> {
            if self.fail_pulse {
                Err(HapticError::Playback("stub refused".into()))
            } else {
                self.fired.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    fn playing_session(envelope: AmplitudeEnvelope) -> PlaybackSession {
        let mut session = PlaybackSession::new();
        session.load_asset(AssetInfo {
            path: PathBuf::from("/media/clip.mov"),
            duration_seconds: 10.0,
            sample_rate: 44100,
            channels: 2,
        });
        session.adopt_envelope(envelope);
        session.play();
        session
    }

    fn flat_envelope(value: f32) -> AmplitudeEnvelope {
        AmplitudeEnvelope::from_bars(vec![value; 360])
    }

    #[test]
    fn test_pulse_emitted_while_playing() {
        let policy = TriggerPolicy::default();
        let mut session = playing_session(flat_envelope(0.5));

        let pulse = policy.evaluate(&mut session, true, Instant::now()).unwrap();
        assert_eq!(pulse.intensity, 0.5);
        assert!((pulse.sharpness - 0.7).abs() < 1e-6);
        assert!(session.last_pulse_at.is_some());
    }

    #[test]
    fn test_minimum_pulse_spacing() {
        let policy = TriggerPolicy::default();
        let mut session = playing_session(flat_envelope(0.5));
        let start = Instant::now();

        // First attempt fires
        assert!(policy.evaluate(&mut session, true, start).is_some());
        // 50ms later: suppressed
        let second = start + Duration::from_millis(50);
        assert!(policy.evaluate(&mut session, true, second).is_none());
        // 40ms after that (90ms after the first): allowed
        let third = second + Duration::from_millis(40);
        assert!(policy.evaluate(&mut session, true, third).is_some());
    }

    #[test]
    fn test_spacing_measured_from_last_emitted_pulse() {
        let policy = TriggerPolicy::default();
        let mut session = playing_session(flat_envelope(0.5));
        let start = Instant::now();

        assert!(policy.evaluate(&mut session, true, start).is_some());

        // A long run of suppressed attempts never pushes the window out
        for ms in [10u64, 20, 30, 40, 50, 60, 70] {
            assert!(policy
                .evaluate(&mut session, true, start + Duration::from_millis(ms))
                .is_none());
        }
        assert!(policy
            .evaluate(&mut session, true, start + Duration::from_millis(80))
            .is_some());
    }

    #[test]
    fn test_quiet_bars_suppressed() {
        let policy = TriggerPolicy::default();
        let mut session = playing_session(flat_envelope(0.02));

        assert!(policy.evaluate(&mut session, true, Instant::now()).is_none());
        // A suppressed pulse leaves the spacing timer untouched
        assert!(session.last_pulse_at.is_none());
    }

    #[test]
    fn test_scrub_suppresses_pulses() {
        let policy = TriggerPolicy::default();
        let mut session = playing_session(flat_envelope(1.0));
        session.begin_scrub();

        assert!(policy.evaluate(&mut session, true, Instant::now()).is_none());
    }

    #[test]
    fn test_not_playing_suppresses_pulses() {
        let policy = TriggerPolicy::default();
        let mut session = playing_session(flat_envelope(1.0));
        session.pause();

        assert!(policy.evaluate(&mut session, true, Instant::now()).is_none());
    }

    #[test]
    fn test_unavailable_suppresses_pulses() {
        let policy = TriggerPolicy::default();
        let mut session = playing_session(flat_envelope(1.0));

        assert!(policy.evaluate(&mut session, false, Instant::now()).is_none());
    }

    #[test]
    fn test_empty_envelope_suppresses_pulses() {
        let policy = TriggerPolicy::default();
        let mut session = playing_session(AmplitudeEnvelope::default());

        assert!(policy.evaluate(&mut session, true, Instant::now()).is_none());
    }

    #[test]
    fn test_pause_rearms_spacing_timer() {
        let policy = TriggerPolicy::default();
        let mut session = playing_session(flat_envelope(0.5));
        let start = Instant::now();

        assert!(policy.evaluate(&mut session, true, start).is_some());

        // Pause and immediately resume: the next pulse must not be blocked
        // by the stale timestamp
        session.pause();
        session.play();
        let resumed = start + Duration::from_millis(10);
        assert!(policy.evaluate(&mut session, true, resumed).is_some());
    }

    #[test]
    fn test_intensity_and_sharpness_shaping() {
        let policy = TriggerPolicy::default();

        // Quiet but audible bars are floored at 0.1 intensity
        let mut session = playing_session(flat_envelope(0.05));
        let pulse = policy.evaluate(&mut session, true, Instant::now()).unwrap();
        assert_eq!(pulse.intensity, 0.1);

        // Loud bars cap sharpness at 0.95
        let mut session = playing_session(flat_envelope(0.9));
        let pulse = policy.evaluate(&mut session, true, Instant::now()).unwrap();
        assert_eq!(pulse.intensity, 0.9);
        assert_eq!(pulse.sharpness, 0.95);
    }

    #[test]
    fn test_engine_start_failure_latches_unavailable() {
        let (mut stub, _fired) = StubActuator::new();
        stub.fail_start = true;
        let mut engine = HapticEngine::new(Box::new(stub));

        assert!(!engine.start());
        assert!(!engine.is_available());
        assert!(!engine.fire(HapticPulse::new(0.5, 0.7)));
    }

    #[test]
    fn test_engine_pulse_failure_latches_unavailable() {
        let (mut stub, fired) = StubActuator::new();
        stub.fail_pulse = true;
        let mut engine = HapticEngine::new(Box::new(stub));

        assert!(engine.start());
        assert!(!engine.fire(HapticPulse::new(0.5, 0.7)));
        assert!(!engine.is_available());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_engine_fires_while_available() {
        let (stub, fired) = StubActuator::new();
        let mut engine = HapticEngine::new(Box::new(stub));

        engine.start();
        assert!(engine.fire(HapticPulse::new(0.5, 0.7)));
        assert!(engine.fire(HapticPulse::new(0.8, 0.95)));
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_engine_reset_signal_reprobes() {
        let (stub, _fired) = StubActuator::new();
        let mut engine = HapticEngine::new(Box::new(stub));

        engine.start();
        engine.handle_signal(ActuatorSignal::Reset);
        assert!(engine.is_available());

        engine.handle_signal(ActuatorSignal::Stopped);
        assert!(!engine.is_available());
        assert!(engine.ensure_started());
    }
}
