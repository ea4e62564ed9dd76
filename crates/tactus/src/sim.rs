//! Simulated collaborators for the demo shell.
//!
//! Stands in for the platform media player and haptic driver: a wall-clock
//! transport and an actuator that logs each pulse.

use std::time::Instant;

use tactus_core::{AssetInfo, HapticActuator, HapticError, HapticPulse, MediaPlayer, SeekError};

/// Media transport driven by the wall clock.
pub struct SimulatedPlayer {
    playing: bool,
    position: f64,
    duration: f64,
    resumed_at: Option<Instant>,
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        Self {
            playing: false,
            position: 0.0,
            duration: 0.0,
            resumed_at: None,
        }
    }

    fn clock(&self) -> f64 {
        match (self.playing, self.resumed_at) {
            (true, Some(at)) => self.position + at.elapsed().as_secs_f64(),
            _ => self.position,
        }
    }
}

impl Default for SimulatedPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaPlayer for SimulatedPlayer {
    fn load(&mut self, info: &AssetInfo) {
        self.duration = info.duration_seconds;
        self.position = 0.0;
        self.playing = false;
        self.resumed_at = None;
        log::debug!("Simulated player loaded {:.2}s asset", self.duration);
    }

    fn play(&mut self) {
        if !self.playing {
            self.playing = true;
            self.resumed_at = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.position = self.clock().min(self.duration);
        self.playing = false;
        self.resumed_at = None;
    }

    fn seek(&mut self, seconds: f64) -> Result<(), SeekError> {
        if !(0.0..=self.duration).contains(&seconds) {
            return Err(SeekError::new(seconds, "position out of range"));
        }
        self.position = seconds;
        if self.playing {
            self.resumed_at = Some(Instant::now());
        }
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.clock().min(self.duration)
    }

    fn has_reached_end(&self) -> bool {
        self.duration > 0.0 && self.clock() >= self.duration
    }
}

/// Actuator that renders pulses to the log instead of hardware.
pub struct LogActuator;

impl HapticActuator for LogActuator {
    fn start(&mut self) -> Result<(), HapticError> {
        log::debug!("Log actuator started");
        Ok(())
    }

    fn stop(&mut self) {}

    fn fire_pulse(&mut self, pulse: HapticPulse) -> Result<(), HapticError> {
        log::info!(
            "~ pulse  intensity={:.2} sharpness={:.2}",
            pulse.intensity,
            pulse.sharpness
        );
        Ok(())
    }
}
