//! Shared foundation for the Tactus playback core.
//!
//! Defines the collaborator interfaces (media asset source, media player,
//! haptic actuator), the command/event vocabulary between the shell and the
//! player module, the error taxonomy, and the configuration layer.

pub use config::{ConfigError, ConfigFile, ConfigManager, Settings};
pub use error::{AssetError, DecodeError, ExtractionError, HapticError, SeekError};
pub use haptic::{ActuatorSignal, HapticActuator, HapticPulse};
pub use media::{AssetInfo, FileAssetSource, MediaAssetSource, MediaPlayer};
pub use messages::{PlayerCommand, PlayerEvent};
pub use modules::{AsyncModule, ModuleId, ModuleMessage};

mod config;
mod error;
mod haptic;
mod media;
pub mod messages;
mod modules;
