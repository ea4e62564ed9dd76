//! Haptic actuator interface and pulse value types.
//!
//! The actuator itself is an external collaborator (the platform haptic
//! driver); this module only defines what is requested of it.

use serde::{Deserialize, Serialize};

use crate::error::HapticError;

/// A single transient haptic pulse request.
///
/// Constructed by the trigger policy and dispatched immediately; never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HapticPulse {
    /// Pulse strength (0.0-1.0).
    pub intensity: f32,
    /// Pulse attack character (0.0-1.0, higher = crisper).
    pub sharpness: f32,
}

impl HapticPulse {
    /// Create a pulse, clamping both parameters into [0, 1].
    pub fn new(intensity: f32, sharpness: f32) -> Self {
        Self {
            intensity: intensity.clamp(0.0, 1.0),
            sharpness: sharpness.clamp(0.0, 1.0),
        }
    }
}

/// Asynchronous notifications from the haptic hardware.
///
/// Delivered by the platform shell; the engine reacts by clearing its
/// trigger-timing state, never by assuming synchronous recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorSignal {
    /// The engine was reset by the system (e.g. after an interruption);
    /// the actuator must be re-probed before the next pulse.
    Reset,
    /// The engine was stopped by the system.
    Stopped,
}

/// Interface to the haptic hardware driver.
pub trait HapticActuator: Send + Sync {
    /// Probe and start the engine.
    fn start(&mut self) -> Result<(), HapticError>;

    /// Stop the engine. Idempotent.
    fn stop(&mut self);

    /// Play a single transient pulse.
    fn fire_pulse(&mut self, pulse: HapticPulse) -> Result<(), HapticError>;
}
