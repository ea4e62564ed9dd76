//! Peak-amplitude envelope reduction.
//!
//! Collapses a raw sample buffer into a small fixed-size envelope suitable
//! for both waveform rendering and haptic triggering. Reduction is a pure
//! function of the input buffer and the target bar count.

use serde::{Deserialize, Serialize};

/// Default number of envelope bars.
pub const DEFAULT_ENVELOPE_BARS: usize = 360;

/// Normalized peak-amplitude envelope of an audio buffer.
///
/// Values are in [0, 1]; the maximum equals 1.0 whenever any non-silent
/// sample exists, otherwise every bar is 0. Immutable once built: a new
/// asset gets a new envelope, never an in-place update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmplitudeEnvelope {
    bars: Vec<f32>,
}

impl AmplitudeEnvelope {
    /// Reduce a raw sample buffer to at most `target_bars` peak values.
    ///
    /// The buffer is walked in buckets of `max(1, len / target_bars)`
    /// samples; each bar is the bucket's peak absolute amplitude mapped to
    /// [0, 1], and the whole envelope is then normalized by its global
    /// peak. A silent buffer stays all-zero. A buffer shorter than
    /// `target_bars` yields fewer, coarser bars.
    pub fn reduce(samples: &[i16], target_bars: usize) -> Self {
        debug_assert!(target_bars > 0, "target bar count must be positive");
        if target_bars == 0 || samples.is_empty() {
            return Self::default();
        }

        let bucket_size = (samples.len() / target_bars).max(1);

        let mut bars: Vec<f32> = samples
            .chunks(bucket_size)
            .take(target_bars)
            .map(|bucket| {
                bucket
                    .iter()
                    .map(|&s| (s as f32 / 32768.0).abs())
                    .fold(0.0f32, f32::max)
            })
            .collect();

        let global_peak = bars.iter().copied().fold(0.0f32, f32::max);
        if global_peak > 0.0 {
            for bar in &mut bars {
                *bar /= global_peak;
            }
        }

        Self { bars }
    }

    /// Build an envelope from precomputed bars, clamping values into [0, 1].
    pub fn from_bars(bars: Vec<f32>) -> Self {
        Self {
            bars: bars.into_iter().map(|b| b.clamp(0.0, 1.0)).collect(),
        }
    }

    /// Number of bars.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// True when the envelope holds no bars.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The bar values.
    pub fn bars(&self) -> &[f32] {
        &self.bars
    }

    /// Map normalized progress (0.0-1.0) to a bar index.
    pub fn index_for_progress(&self, progress: f64) -> Option<usize> {
        let n = self.bars.len();
        if n == 0 {
            return None;
        }
        let t = progress.clamp(0.0, 1.0);
        Some(((t * (n - 1) as f64).floor() as usize).min(n - 1))
    }

    /// Look up the bar value at normalized progress.
    pub fn value_at_progress(&self, progress: f64) -> Option<f32> {
        self.index_for_progress(progress).map(|i| self.bars[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer() {
        let envelope = AmplitudeEnvelope::reduce(&[], 360);
        assert!(envelope.is_empty());
        assert_eq!(envelope.index_for_progress(0.5), None);
    }

    #[test]
    fn test_silent_buffer_is_all_zero() {
        // 10,000 zero samples reduce to a full-length all-zero envelope
        let samples = vec![0i16; 10_000];
        let envelope = AmplitudeEnvelope::reduce(&samples, 360);

        assert_eq!(envelope.len(), 360);
        assert!(envelope.bars().iter().all(|&b| b == 0.0));
        assert!(envelope.bars().iter().all(|b| b.is_finite()));
    }

    #[test]
    fn test_single_peak_normalizes_to_one() {
        // One sample at maximum magnitude, rest silent: exactly one bar at
        // 1.0, all others 0.0
        let mut samples = vec![0i16; 10_000];
        samples[5_000] = i16::MAX;

        let envelope = AmplitudeEnvelope::reduce(&samples, 360);
        let ones = envelope.bars().iter().filter(|&&b| b == 1.0).count();
        let zeros = envelope.bars().iter().filter(|&&b| b == 0.0).count();

        assert_eq!(ones, 1);
        assert_eq!(zeros, envelope.len() - 1);
    }

    #[test]
    fn test_length_bound() {
        for &(len, target) in &[(0usize, 360usize), (7, 360), (360, 360), (10_000, 360), (99_991, 77)] {
            let samples = vec![100i16; len];
            let envelope = AmplitudeEnvelope::reduce(&samples, target);
            assert!(envelope.len() <= target, "len {} target {}", len, target);
            assert_eq!(envelope.is_empty(), len == 0);
        }
    }

    #[test]
    fn test_short_buffer_yields_fewer_bars() {
        let samples = vec![500i16; 12];
        let envelope = AmplitudeEnvelope::reduce(&samples, 360);
        assert_eq!(envelope.len(), 12);
    }

    #[test]
    fn test_normalization_invariant() {
        let samples: Vec<i16> = (0..20_000).map(|i| ((i * 37) % 9000) as i16).collect();
        let envelope = AmplitudeEnvelope::reduce(&samples, 360);

        let max = envelope.bars().iter().copied().fold(0.0f32, f32::max);
        assert_eq!(max, 1.0);
        assert!(envelope.bars().iter().all(|&b| (0.0..=1.0).contains(&b)));
    }

    #[test]
    fn test_negative_peaks_count() {
        let mut samples = vec![0i16; 1000];
        samples[10] = -20_000;
        let envelope = AmplitudeEnvelope::reduce(&samples, 100);
        let max = envelope.bars().iter().copied().fold(0.0f32, f32::max);
        assert_eq!(max, 1.0);
    }

    #[test]
    fn test_determinism() {
        let samples: Vec<i16> = (0..50_000).map(|i| ((i * 7919) % 30_000) as i16 - 15_000).collect();
        let a = AmplitudeEnvelope::reduce(&samples, 360);
        let b = AmplitudeEnvelope::reduce(&samples, 360);
        assert_eq!(a, b);
    }

    #[test]
    fn test_index_for_progress() {
        // Midpoint of a 360-bar envelope lands on bar 179
        let envelope = AmplitudeEnvelope::from_bars(vec![0.5; 360]);
        assert_eq!(envelope.index_for_progress(0.5), Some(179));
        assert_eq!(envelope.index_for_progress(0.0), Some(0));
        assert_eq!(envelope.index_for_progress(1.0), Some(359));
        // Out-of-range progress clamps
        assert_eq!(envelope.index_for_progress(1.5), Some(359));
        assert_eq!(envelope.index_for_progress(-0.2), Some(0));
    }

    #[test]
    fn test_from_bars_clamps() {
        let envelope = AmplitudeEnvelope::from_bars(vec![-0.5, 0.5, 1.5]);
        assert_eq!(envelope.bars(), &[0.0, 0.5, 1.0]);
    }
}
