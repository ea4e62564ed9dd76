//! Audio analysis: PCM extraction and amplitude envelope reduction.

mod envelope;
mod extractor;

pub use envelope::{AmplitudeEnvelope, DEFAULT_ENVELOPE_BARS};
pub use extractor::{extract_samples, extract_samples_with_progress, ExtractedAudio};
