//! Synth Settings
//!
//! Plain serde-backed configuration for a whole instrument: spectral layers,
//! master gain, envelope and offline-sample parameters. Every field has a
//! default, so partial JSON documents are accepted.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::render::RenderOptions;
use crate::engine::synth::DEFAULT_MASTER_GAIN;
use crate::engine::Envelope;
use crate::error::{Result, XenError};
use crate::spectrum::{recalculate, LayerSettings, Spectrum, SpectrumSettings};

/// Default length of a rendered sample in seconds
pub const DEFAULT_SAMPLE_DURATION: f64 = 10.0;

/// Default fundamental of a rendered sample in Hz
pub const DEFAULT_SAMPLE_FUNDAMENTAL: f64 = 440.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SynthSettings {
    pub layers: Vec<LayerSettings>,
    pub master_gain: f64,
    pub envelope: Envelope,
    pub sample_duration: f64,
    pub sample_fundamental: f64,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            layers: vec![LayerSettings::default()],
            master_gain: DEFAULT_MASTER_GAIN,
            envelope: Envelope::default(),
            sample_duration: DEFAULT_SAMPLE_DURATION,
            sample_fundamental: DEFAULT_SAMPLE_FUNDAMENTAL,
        }
    }
}

impl SynthSettings {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.master_gain >= 0.0) || !self.master_gain.is_finite() {
            return Err(XenError::InvalidSettings {
                reason: format!("master gain cannot be negative, got {}", self.master_gain),
            });
        }
        self.envelope.validate()?;

        for (index, layer) in self.layers.iter().enumerate() {
            if let Err(err) = layer.validate() {
                tracing::debug!(index, error = %err, "invalid layer settings");
                return Err(err);
            }
        }

        self.render_options().validate()
    }

    pub fn spectrum_settings(&self) -> SpectrumSettings {
        SpectrumSettings {
            layers: self.layers.clone(),
        }
    }

    /// Recompute the spectrum described by the layers
    pub fn build_spectrum<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Spectrum> {
        recalculate(&self.spectrum_settings(), rng)
    }

    /// Offline render parameters for the sample export
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            duration: self.sample_duration,
            fundamental: self.sample_fundamental,
            ..RenderOptions::default()
        }
    }
}
