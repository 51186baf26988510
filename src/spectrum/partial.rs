//! Partial, layer and spectrum value types
//!
//! A `Partial` is a single sinusoid described relative to a fundamental.
//! Layers and spectra are ordered, immutable collections of them: every
//! transformation returns a new value instead of mutating shared state.

use serde::{Deserialize, Serialize};

use crate::error::{Result, XenError};

// ============================================================================
// Constants
// ============================================================================

/// Number of decimal digits kept on generated rates and amplitudes
pub const PRECISION: i32 = 10;

/// Rates closer than this are considered the same frequency
pub const RATE_EPSILON: f64 = 1e-9;

// ============================================================================
// Helper Functions
// ============================================================================

/// Round a value to the given number of decimal digits
#[inline]
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Convert a frequency ratio to cents. Non-positive ratios map to 0.
#[inline]
pub fn ratio_to_cents(ratio: f64) -> f64 {
    if ratio > 0.0 {
        1200.0 * ratio.log2()
    } else {
        0.0
    }
}

/// Convert cents to a frequency ratio
#[inline]
pub fn cents_to_ratio(cents: f64) -> f64 {
    2f64.powf(cents / 1200.0)
}

// ============================================================================
// Partial
// ============================================================================

/// One sinusoidal component of a composite tone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Partial {
    /// Frequency ratio relative to the fundamental (always > 0)
    pub rate: f64,
    /// Linear amplitude (always >= 0)
    pub amplitude: f64,
    /// Optional start phase as a fraction of a cycle, in [0, 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<f64>,
}

impl Partial {
    /// Create a partial without a phase
    ///
    /// # Errors
    /// `InvalidPartial` if `rate <= 0` or `amplitude < 0`.
    pub fn new(rate: f64, amplitude: f64) -> Result<Self> {
        let partial = Self {
            rate,
            amplitude,
            phase: None,
        };
        partial.validate()?;
        Ok(partial)
    }

    /// Return a copy of this partial with the given phase
    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = Some(phase.rem_euclid(1.0));
        self
    }

    /// Absolute frequency of the partial for a given fundamental in Hz
    #[inline]
    pub fn frequency(&self, fundamental: f64) -> f64 {
        self.rate * fundamental
    }

    /// Check the partial invariants
    pub fn validate(&self) -> Result<()> {
        if !(self.rate > 0.0) || !self.rate.is_finite() {
            return Err(XenError::InvalidPartial {
                reason: format!("rate must be positive, got {}", self.rate),
            });
        }
        if !(self.amplitude >= 0.0) || !self.amplitude.is_finite() {
            return Err(XenError::InvalidPartial {
                reason: format!("amplitude must be non-negative, got {}", self.amplitude),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Spectral Layer
// ============================================================================

/// Ordered partials of one additive layer
///
/// Position matters: index `i` maps to oscillator `i` of a live bank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectralLayer {
    pub partials: Vec<Partial>,
}

impl SpectralLayer {
    pub fn new(partials: Vec<Partial>) -> Self {
        Self { partials }
    }

    pub fn len(&self) -> usize {
        self.partials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partials.is_empty()
    }
}

impl From<Vec<Partial>> for SpectralLayer {
    fn from(partials: Vec<Partial>) -> Self {
        Self { partials }
    }
}

// ============================================================================
// Spectrum
// ============================================================================

/// Ordered sequence of spectral layers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Spectrum {
    layers: Vec<SpectralLayer>,
}

impl Spectrum {
    pub fn new(layers: Vec<SpectralLayer>) -> Self {
        Self { layers }
    }

    /// Spectrum with a single layer
    pub fn single(partials: Vec<Partial>) -> Self {
        Self {
            layers: vec![SpectralLayer::new(partials)],
        }
    }

    pub fn layers(&self) -> &[SpectralLayer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&SpectralLayer> {
        self.layers.get(index)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// All partials of every layer, sorted ascending by rate
    pub fn all_partials(&self) -> Vec<Partial> {
        let mut partials: Vec<Partial> = self
            .layers
            .iter()
            .flat_map(|layer| layer.partials.iter().copied())
            .collect();
        partials.sort_by(|a, b| a.rate.total_cmp(&b.rate));
        partials
    }

    /// Partials actually sounding when the given keys are held
    ///
    /// Every key ratio transposes the whole spectrum; the union is returned
    /// sorted by rate. Non-positive key ratios are skipped.
    pub fn audible_partials(&self, key_ratios: &[f64]) -> Vec<Partial> {
        let base = self.all_partials();
        let mut audible: Vec<Partial> = key_ratios
            .iter()
            .filter(|ratio| **ratio > 0.0)
            .flat_map(|ratio| {
                base.iter().map(move |p| Partial {
                    rate: p.rate * ratio,
                    ..*p
                })
            })
            .collect();
        audible.sort_by(|a, b| a.rate.total_cmp(&b.rate));
        audible
    }
}

impl From<Vec<SpectralLayer>> for Spectrum {
    fn from(layers: Vec<SpectralLayer>) -> Self {
        Self { layers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn partial(rate: f64, amplitude: f64) -> Partial {
        Partial::new(rate, amplitude).unwrap()
    }

    #[test]
    fn test_ratio_to_cents() {
        assert_eq!(ratio_to_cents(1.0), 0.0);
        assert_relative_eq!(ratio_to_cents(0.5), -1200.0);
        assert_relative_eq!(ratio_to_cents(2.0), 1200.0);
        assert_relative_eq!(ratio_to_cents(5.0 / 4.0), 386.3137138648348, epsilon = 1e-9);
        assert_eq!(ratio_to_cents(0.0), 0.0);
        assert_eq!(ratio_to_cents(-1.0), 0.0);
    }

    #[test]
    fn test_cents_to_ratio() {
        assert_eq!(cents_to_ratio(0.0), 1.0);
        assert_relative_eq!(cents_to_ratio(1200.0), 2.0);
        assert_relative_eq!(cents_to_ratio(-1200.0), 0.5);
        assert_relative_eq!(cents_to_ratio(386.0), 1.249773510228908, epsilon = 1e-12);
    }

    #[test]
    fn test_partial_rejects_invalid_values() {
        assert!(Partial::new(0.0, 1.0).is_err());
        assert!(Partial::new(-2.0, 1.0).is_err());
        assert!(Partial::new(1.0, -0.1).is_err());
        assert!(Partial::new(f64::NAN, 1.0).is_err());
        assert!(Partial::new(1.0, 0.0).is_ok());
    }

    #[test]
    fn test_with_phase_wraps() {
        let p = partial(1.0, 1.0).with_phase(1.25);
        assert_relative_eq!(p.phase.unwrap(), 0.25);
    }

    #[test]
    fn test_all_partials_sorted_across_layers() {
        let spectrum = Spectrum::new(vec![
            SpectralLayer::new(vec![partial(1.0, 1.0), partial(3.0, 0.3)]),
            SpectralLayer::new(vec![partial(2.0, 0.5)]),
        ]);

        let rates: Vec<f64> = spectrum.all_partials().iter().map(|p| p.rate).collect();
        assert_eq!(rates, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_audible_partials_transposes_per_key() {
        let spectrum = Spectrum::single(vec![partial(1.0, 1.0), partial(2.0, 0.5)]);
        let audible = spectrum.audible_partials(&[1.0, 1.5, -1.0]);

        let rates: Vec<f64> = audible.iter().map(|p| p.rate).collect();
        assert_eq!(rates, vec![1.0, 1.5, 2.0, 3.0]);
    }

    #[test]
    fn test_spectrum_serializes_as_layer_list() {
        let spectrum = Spectrum::single(vec![partial(1.0, 1.0)]);
        let json = serde_json::to_string(&spectrum).unwrap();
        assert_eq!(json, r#"[{"partials":[{"rate":1.0,"amplitude":1.0}]}]"#);
    }
}
