//! Media collaborator interfaces.
//!
//! Video decoding and rendering live outside this workspace; the core only
//! needs to resolve asset metadata, locate the audio stream, and follow the
//! player's clock.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{AssetError, SeekError};

/// Resolved metadata for a loaded media asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetInfo {
    /// Source path of the asset.
    pub path: PathBuf,
    /// Total duration in seconds.
    pub duration_seconds: f64,
    /// Sample rate of the audio stream in Hz.
    pub sample_rate: u32,
    /// Number of audio channels.
    pub channels: u8,
}

impl AssetInfo {
    /// Get a short display label for the asset (file name, or full path).
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Source of media assets: resolves duration and locates the audio stream.
pub trait MediaAssetSource: Send {
    /// Resolve asset metadata, failing if the asset is unreadable or holds
    /// no audio stream.
    fn resolve(&self) -> Result<AssetInfo, AssetError>;

    /// Path to the decodable audio, if the asset has one.
    fn audio_path(&self) -> Option<PathBuf>;
}

/// File-backed asset source using symphonia's format probe.
#[derive(Debug, Clone)]
pub struct FileAssetSource {
    path: PathBuf,
}

impl FileAssetSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl MediaAssetSource for FileAssetSource {
    fn resolve(&self) -> Result<AssetInfo, AssetError> {
        let file = File::open(&self.path).map_err(|e| AssetError::Unreadable(e.to_string()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = self.path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AssetError::Unreadable(e.to_string()))?;

        let track = probed
            .format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(AssetError::NoAudioTrack)?;

        let params = &track.codec_params;
        let sample_rate = params.sample_rate.unwrap_or(44100);
        let channels = params.channels.map(|c| c.count() as u8).unwrap_or(2);
        let duration_seconds = params
            .n_frames
            .map(|frames| frames as f64 / sample_rate as f64)
            .ok_or_else(|| AssetError::Unreadable("duration unavailable".into()))?;

        Ok(AssetInfo {
            path: self.path.clone(),
            duration_seconds,
            sample_rate,
            channels,
        })
    }

    fn audio_path(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }
}

/// The external media player's transport and clock.
///
/// The playback core polls `current_time` at tick rate (~30 Hz) while
/// playing; it never renders audio or video itself.
pub trait MediaPlayer: Send + Sync {
    /// Tell the player which asset is active.
    fn load(&mut self, info: &AssetInfo);

    /// Start or resume playback.
    fn play(&mut self);

    /// Pause playback.
    fn pause(&mut self);

    /// Seek to an absolute position in seconds. A failed seek leaves the
    /// player position unchanged.
    fn seek(&mut self, seconds: f64) -> Result<(), SeekError>;

    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    /// One-shot end-of-media indicator.
    fn has_reached_end(&self) -> bool;
}
