//! Bar-waveform view model.
//!
//! Pure layout over an amplitude envelope: per-bar geometry plus a scrub
//! indicator position. When no asset has been analyzed yet a deterministic
//! procedural placeholder stands in so the scrubber never renders empty.

/// Number of bars in the procedural placeholder.
pub const PLACEHOLDER_BARS: usize = 90;

/// Minimum rendered bar height fraction so silent bars stay visible.
const MIN_BAR_FRACTION: f32 = 0.04;

/// Geometry for a single waveform bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformBar {
    /// Left edge of the bar.
    pub x: f32,
    /// Bar height, vertically centered by the renderer.
    pub height: f32,
}

/// Laid-out waveform with a position indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformView {
    /// Bars in display order.
    pub bars: Vec<WaveformBar>,
    /// Width of each bar slot.
    pub bar_width: f32,
    /// Horizontal position of the playback indicator.
    pub indicator_x: f32,
}

/// Lay out envelope bars into a `width` x `height` box with the indicator
/// at normalized `progress`.
pub fn layout(bars: &[f32], progress: f64, width: f32, height: f32) -> WaveformView {
    let n = bars.len();
    let bar_width = if n == 0 { 0.0 } else { width / n as f32 };

    let laid_out = bars
        .iter()
        .enumerate()
        .map(|(i, &value)| WaveformBar {
            x: i as f32 * bar_width,
            height: (value.clamp(0.0, 1.0) * height).max(MIN_BAR_FRACTION * height),
        })
        .collect();

    WaveformView {
        bars: laid_out,
        bar_width,
        indicator_x: progress.clamp(0.0, 1.0) as f32 * width,
    }
}

/// Deterministic placeholder bars for the not-yet-analyzed state.
///
/// A slow beat overlaid with faster ripple, shaped to read like audio
/// rather than noise.
pub fn placeholder(bar_count: usize) -> Vec<f32> {
    (0..bar_count)
        .map(|i| {
            let t = i as f32;
            let slow = (t * 0.071).sin();
            let fast = (t * 0.53).sin();
            (0.35 + 0.4 * slow.abs() + 0.25 * fast.abs()).clamp(0.08, 1.0)
        })
        .collect()
}
