//! PCM extraction from media containers.
//!
//! Decodes the first audio stream of a container to interleaved signed
//! 16-bit samples, packet by packet. Extraction either completes with the
//! full buffer or fails; partial output is never surfaced.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tactus_core::{AssetError, DecodeError, ExtractionError};

/// Raw PCM extracted from a media asset.
#[derive(Debug, Clone)]
pub struct ExtractedAudio {
    /// Channel-interleaved samples in decode order.
    pub samples: Vec<i16>,
    /// Sample rate of the source stream in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: usize,
}

impl ExtractedAudio {
    /// Duration of the extracted audio in seconds.
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        (self.samples.len() / self.channels) as f64 / self.sample_rate as f64
    }
}

/// Extract all PCM samples from a media file.
pub fn extract_samples<P: AsRef<Path>>(path: P) -> Result<ExtractedAudio, ExtractionError> {
    extract_samples_with_progress(path, |_| {})
}

/// Extract all PCM samples, reporting fraction-complete as packets decode.
///
/// Progress is derived from the stream's frame count when the container
/// reports one; containers without a known length only report completion.
pub fn extract_samples_with_progress<P, F>(
    path: P,
    mut on_progress: F,
) -> Result<ExtractedAudio, ExtractionError>
where
    P: AsRef<Path>,
    F: FnMut(f32),
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| AssetError::Unreadable(e.to_string()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
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

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AssetError::NoAudioTrack)?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);
    let total_frames = track.codec_params.n_frames;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AssetError::DecoderOpen(e.to_string()))?;

    let mut samples: Vec<i16> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<i16>> = None;
    let mut frames_read: u64 = 0;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::IoError(e)) => {
                return Err(DecodeError::Io(e.to_string()).into());
            }
            Err(e) => {
                return Err(DecodeError::CorruptStream(e.to_string()).into());
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| DecodeError::CorruptStream(e.to_string()))?;

        let frames = decoded.frames();
        if frames == 0 {
            continue;
        }

        let buf = sample_buf.get_or_insert_with(|| {
            SampleBuffer::<i16>::new(decoded.capacity() as u64, *decoded.spec())
        });
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());

        frames_read += frames as u64;
        if let Some(total) = total_frames {
            if total > 0 {
                on_progress((frames_read as f32 / total as f32).min(1.0));
            }
        }
    }

    on_progress(1.0);

    log::debug!(
        "Extracted {} samples ({} Hz, {} channels) from {:?}",
        samples.len(),
        sample_rate,
        channels,
        path
    );

    Ok(ExtractedAudio {
        samples,
        sample_rate,
        channels,
    })
}
