//! Layer recompute
//!
//! Turns plain per-layer parameter structs into a fresh [`Spectrum`]. This is
//! the entry point the UI layer calls whenever a parameter changes; nothing
//! here holds state between calls.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::compose::{attach_random_phases, scale_amplitudes, shift, tweak, Tweak};
use super::generator::{generate, SeriesOptions};
use super::partial::{SpectralLayer, Spectrum};
use crate::error::{Result, XenError};

/// Parameters of one spectral layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerSettings {
    pub series: SeriesOptions,
    /// Transposition ratio applied after generation
    pub transpose: f64,
    /// Amplitude multiplier for the whole layer
    pub gain: f64,
    pub tweaks: Vec<Tweak>,
    pub tweaks_enabled: bool,
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            series: SeriesOptions::harmonic(6),
            transpose: 1.0,
            gain: 1.0,
            tweaks: Vec::new(),
            tweaks_enabled: false,
        }
    }
}

impl LayerSettings {
    pub fn new(series: SeriesOptions) -> Self {
        Self {
            series,
            ..Self::default()
        }
    }

    /// Enable one tweak per partial
    pub fn with_tweaks(mut self, tweaks: Vec<Tweak>) -> Self {
        self.tweaks = tweaks;
        self.tweaks_enabled = true;
        self
    }

    /// Check the layer can be built
    ///
    /// Enabled tweaks must match the number of partials the series actually
    /// produces, so the series is generated once to count them.
    ///
    /// # Errors
    /// The series' own validation error, `InvalidSettings` for a bad
    /// transpose or gain, or `TweakLengthMismatch`.
    pub fn validate(&self) -> Result<()> {
        self.series.validate()?;
        if !(self.transpose > 0.0) || !self.transpose.is_finite() {
            return Err(XenError::InvalidSettings {
                reason: format!("transpose should be greater than zero, got {}", self.transpose),
            });
        }
        if !(self.gain >= 0.0) || !self.gain.is_finite() {
            return Err(XenError::InvalidSettings {
                reason: format!("layer gain cannot be negative, got {}", self.gain),
            });
        }

        if self.tweaks_enabled {
            let partials = generate(&self.series)?.len();
            if self.tweaks.len() != partials {
                return Err(XenError::TweakLengthMismatch {
                    tweaks: self.tweaks.len(),
                    partials,
                });
            }
        }
        Ok(())
    }
}

/// Parameters of a whole spectrum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumSettings {
    pub layers: Vec<LayerSettings>,
}

impl Default for SpectrumSettings {
    fn default() -> Self {
        Self {
            layers: vec![LayerSettings::default()],
        }
    }
}

/// Build one layer: generate, transpose, scale, phase, tweak
pub fn build_layer<R: Rng + ?Sized>(settings: &LayerSettings, rng: &mut R) -> Result<SpectralLayer> {
    let generated = generate(&settings.series)?;
    let transposed = shift(&generated, settings.transpose)?;
    let scaled = scale_amplitudes(&transposed, settings.gain)?;
    let phased = attach_random_phases(&scaled, rng);

    if !settings.tweaks_enabled {
        return Ok(SpectralLayer::new(phased));
    }

    Ok(SpectralLayer::new(tweak(&phased, &settings.tweaks)?))
}

/// Recompute a spectrum from its settings
///
/// # Errors
/// The first layer that fails validation aborts the whole recompute.
pub fn recalculate<R: Rng + ?Sized>(settings: &SpectrumSettings, rng: &mut R) -> Result<Spectrum> {
    let layers = settings
        .layers
        .iter()
        .map(|layer| build_layer(layer, rng))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(layers = layers.len(), "recalculated spectrum");

    Ok(Spectrum::new(layers))
}

/// Apply one tweak list per layer to an existing spectrum
///
/// # Errors
/// `TweakLengthMismatch` if the number of tweak lists differs from the number
/// of layers, or any per-layer tweak failure.
pub fn tweak_spectrum(spectrum: &Spectrum, tweaks: &[Vec<Tweak>]) -> Result<Spectrum> {
    if tweaks.len() != spectrum.len() {
        return Err(XenError::TweakLengthMismatch {
            tweaks: tweaks.len(),
            partials: spectrum.len(),
        });
    }

    let layers = spectrum
        .layers()
        .iter()
        .zip(tweaks)
        .map(|(layer, layer_tweaks)| tweak(&layer.partials, layer_tweaks).map(SpectralLayer::new))
        .collect::<Result<Vec<_>>>()?;

    Ok(Spectrum::new(layers))
}
