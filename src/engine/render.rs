//! Offline Rendering
//!
//! Additive synthesis of a partial set straight into a [`SampleBuffer`],
//! without going through a host backend.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::buffer::{SampleBuffer, DEFAULT_SAMPLE_RATE, RENDER_PEAK};
use crate::error::{Result, XenError};
use crate::spectrum::Partial;

/// Parameters of an offline render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    /// Length in seconds
    pub duration: f64,
    /// Frequency in Hz that partial rates are relative to
    pub fundamental: f64,
    pub sample_rate: u32,
    /// Honour each partial's start phase; all partials start at zero otherwise
    pub with_phases: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            duration: 10.0,
            fundamental: 440.0,
            sample_rate: DEFAULT_SAMPLE_RATE,
            with_phases: true,
        }
    }
}

impl RenderOptions {
    pub fn validate(&self) -> Result<()> {
        if !(self.duration > 0.0) || !self.duration.is_finite() {
            return Err(XenError::InvalidRender {
                reason: format!("duration should be greater than zero, got {}", self.duration),
            });
        }
        if !(self.fundamental > 0.0) || !self.fundamental.is_finite() {
            return Err(XenError::InvalidRender {
                reason: format!("fundamental should be greater than zero, got {}", self.fundamental),
            });
        }
        if self.sample_rate == 0 {
            return Err(XenError::InvalidRender {
                reason: "sample rate should be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn num_samples(&self) -> usize {
        (self.duration * self.sample_rate as f64).round() as usize
    }
}

/// Sum `amplitude · sin(2π·rate·f·t + 2π·phase)` over every partial
///
/// Partials at or above Nyquist are skipped. The result is peak-normalized to
/// 0.7; a silent result stays silent.
///
/// # Errors
/// `InvalidRender` for non-positive duration, fundamental or sample rate.
pub fn render_partials(partials: &[Partial], options: &RenderOptions) -> Result<SampleBuffer> {
    options.validate()?;

    let sample_rate = options.sample_rate as f64;
    let nyquist = sample_rate / 2.0;
    let mut accumulator = vec![0.0f64; options.num_samples()];

    for partial in partials {
        let frequency = partial.frequency(options.fundamental);
        if frequency >= nyquist || partial.amplitude == 0.0 {
            tracing::trace!(frequency, "skipping partial");
            continue;
        }

        let phase = if options.with_phases {
            TAU * partial.phase.unwrap_or(0.0)
        } else {
            0.0
        };
        let step = TAU * frequency / sample_rate;

        for (n, sample) in accumulator.iter_mut().enumerate() {
            *sample += partial.amplitude * (step * n as f64 + phase).sin();
        }
    }

    let mut buffer = SampleBuffer::from_samples(
        accumulator.into_iter().map(|s| s as f32).collect(),
        options.sample_rate,
    )?;
    buffer.normalize_peak(RENDER_PEAK);

    tracing::debug!(
        partials = partials.len(),
        samples = buffer.len(),
        rms = buffer.rms(),
        "rendered partials"
    );

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn options(duration: f64) -> RenderOptions {
        RenderOptions {
            duration,
            fundamental: 100.0,
            sample_rate: 8000,
            with_phases: true,
        }
    }

    #[test]
    fn test_single_partial_is_normalized_sine() {
        let partials = vec![Partial::new(1.0, 0.3).unwrap()];
        let buffer = render_partials(&partials, &options(0.1)).unwrap();

        assert_eq!(buffer.len(), 800);
        assert_relative_eq!(buffer.peak(), RENDER_PEAK, epsilon = 1e-4);
        // sin(0) starts at zero
        assert_eq!(buffer.samples[0], 0.0);
        // a quarter period of 100 Hz at 8 kHz is 20 samples
        assert_relative_eq!(buffer.samples[20], RENDER_PEAK, epsilon = 1e-4);
    }

    #[test]
    fn test_phase_shifts_start() {
        let partials = vec![Partial::new(1.0, 1.0).unwrap().with_phase(0.25)];
        let buffer = render_partials(&partials, &options(0.1)).unwrap();
        assert_relative_eq!(buffer.samples[0], RENDER_PEAK, epsilon = 1e-4);

        let flat = RenderOptions {
            with_phases: false,
            ..options(0.1)
        };
        let buffer = render_partials(&partials, &flat).unwrap();
        assert_eq!(buffer.samples[0], 0.0);
    }

    #[test]
    fn test_empty_and_silent_renders_stay_zero() {
        let buffer = render_partials(&[], &options(0.05)).unwrap();
        assert!(buffer.is_silent());

        let silent = vec![Partial::new(1.0, 0.0).unwrap()];
        assert!(render_partials(&silent, &options(0.05)).unwrap().is_silent());
    }

    #[test]
    fn test_partials_above_nyquist_are_skipped() {
        let partials = vec![Partial::new(50.0, 1.0).unwrap()];
        assert!(render_partials(&partials, &options(0.05)).unwrap().is_silent());
    }

    #[test]
    fn test_invalid_options() {
        assert!(render_partials(&[], &options(0.0)).is_err());
        let no_rate = RenderOptions {
            sample_rate: 0,
            ..options(1.0)
        };
        assert!(matches!(
            render_partials(&[], &no_rate),
            Err(XenError::InvalidRender { .. })
        ));
    }
}
