//! Sample Buffer
//!
//! Fixed-length mono buffer produced by offline rendering, with level
//! helpers used to check and normalize rendered samples.

use crate::error::{Result, XenError};

// ============================================================================
// Constants
// ============================================================================

/// Default sample rate for offline rendering (48kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Peak level rendered samples are normalized to
pub const RENDER_PEAK: f32 = 0.7;

// ============================================================================
// Sample Buffer
// ============================================================================

/// Mono 32-bit float sample buffer
///
/// # Example
/// ```
/// use xenspectra::engine::buffer::{SampleBuffer, DEFAULT_SAMPLE_RATE};
///
/// let buffer = SampleBuffer::new(DEFAULT_SAMPLE_RATE as usize, DEFAULT_SAMPLE_RATE);
/// assert_eq!(buffer.len(), 48000);
/// assert_eq!(buffer.duration_secs(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl SampleBuffer {
    /// Create a silent buffer
    pub fn new(num_samples: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![0.0; num_samples],
            sample_rate,
        }
    }

    /// Wrap existing samples
    ///
    /// # Errors
    /// `InvalidRender` if the sample rate is zero.
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(XenError::InvalidRender {
                reason: "sample rate should be greater than zero".to_string(),
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
    }

    /// Root mean square level
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_squares: f64 = self.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum_squares / self.samples.len() as f64).sqrt() as f32
    }

    /// True if every sample is zero
    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }

    /// Scale so the peak equals `target`. Silent buffers stay silent.
    pub fn normalize_peak(&mut self, target: f32) {
        let peak = self.peak();
        if peak == 0.0 {
            return;
        }
        let gain = target / peak;
        for sample in &mut self.samples {
            *sample *= gain;
        }
    }
}
