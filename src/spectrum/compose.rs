//! Spectrum Composer
//!
//! Pure transformations over partial sequences. Inputs are never mutated;
//! each operation returns a new vector, and a failing operation returns no
//! partial output at all.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::generator::amplitude_for_rate;
use super::partial::{Partial, RATE_EPSILON};
use crate::error::{Result, XenError};

// ============================================================================
// Stretch / Shift
// ============================================================================

/// Raise every rate to `exponent`
///
/// # Errors
/// `NonPositiveExponent` if `exponent <= 0`.
pub fn stretch(partials: &[Partial], exponent: f64) -> Result<Vec<Partial>> {
    if exponent <= 0.0 || !exponent.is_finite() {
        return Err(XenError::NonPositiveExponent { exponent });
    }

    Ok(partials
        .iter()
        .map(|p| Partial {
            rate: p.rate.powf(exponent),
            ..*p
        })
        .collect())
}

/// Multiply every rate by `ratio` (transposition)
///
/// # Errors
/// `NonPositiveShift` if `ratio <= 0`.
pub fn shift(partials: &[Partial], ratio: f64) -> Result<Vec<Partial>> {
    if ratio <= 0.0 || !ratio.is_finite() {
        return Err(XenError::NonPositiveShift { ratio });
    }

    Ok(partials
        .iter()
        .map(|p| Partial {
            rate: p.rate * ratio,
            ..*p
        })
        .collect())
}

/// Multiply every amplitude by `gain`
pub fn scale_amplitudes(partials: &[Partial], gain: f64) -> Result<Vec<Partial>> {
    if gain < 0.0 || !gain.is_finite() {
        return Err(XenError::InvalidPartial {
            reason: format!("amplitude gain cannot be negative, got {gain}"),
        });
    }

    Ok(partials
        .iter()
        .map(|p| Partial {
            amplitude: p.amplitude * gain,
            ..*p
        })
        .collect())
}

/// Build partials from bare rates with a `rate^(-slope)` roll-off
pub fn attach_amplitudes(rates: &[f64], slope: f64) -> Result<Vec<Partial>> {
    if slope < 0.0 {
        return Err(XenError::NegativeAmplitudeSlope { slope });
    }

    rates
        .iter()
        .map(|&rate| Partial::new(rate, amplitude_for_rate(rate, slope)))
        .collect()
}

// ============================================================================
// Combine
// ============================================================================

/// Result of merging several partial groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combined {
    /// Absolute rate of the lowest entry, which became the new fundamental
    pub fundamental: f64,
    /// Merged partials, rates relative to `fundamental`
    pub partials: Vec<Partial>,
}

#[inline]
fn coincident(a: f64, b: f64) -> bool {
    (a - b).abs() <= RATE_EPSILON * a.abs().max(b.abs()).max(1.0)
}

/// Merge partial groups, keeping track of the absolute scale
///
/// Entries are sorted ascending; coincident rates collapse into one entry
/// whose amplitude is the sum of the merged amplitudes (the first entry's
/// phase is kept). Rates are then expressed relative to the lowest entry.
/// An empty input yields an empty result with fundamental 1.
pub fn combine_absolute(groups: &[&[Partial]]) -> Combined {
    let mut all: Vec<Partial> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    all.sort_by(|a, b| a.rate.total_cmp(&b.rate));

    let mut merged: Vec<Partial> = Vec::with_capacity(all.len());
    for partial in all {
        match merged.last_mut() {
            Some(last) if coincident(last.rate, partial.rate) => {
                last.amplitude += partial.amplitude;
            }
            _ => merged.push(partial),
        }
    }

    let Some(fundamental) = merged.first().map(|p| p.rate) else {
        return Combined {
            fundamental: 1.0,
            partials: merged,
        };
    };

    for (i, partial) in merged.iter_mut().enumerate() {
        partial.rate = if i == 0 {
            1.0
        } else {
            partial.rate / fundamental
        };
    }

    Combined {
        fundamental,
        partials: merged,
    }
}

/// Merge partial groups into one sequence relative to its lowest partial
pub fn combine(groups: &[&[Partial]]) -> Vec<Partial> {
    combine_absolute(groups).partials
}

// ============================================================================
// Tweaks
// ============================================================================

/// Per-partial multiplicative adjustment
///
/// Unset fields leave the matching property untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Tweak {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<f64>,
}

impl Tweak {
    /// Tweak that leaves a partial unchanged
    pub fn identity() -> Self {
        Self {
            rate: Some(1.0),
            amplitude: Some(1.0),
            phase: None,
        }
    }

    /// Rate tweak given as an integer fraction, e.g. 81/80
    ///
    /// # Errors
    /// `InvalidFraction` if either side is zero.
    pub fn from_fraction(numerator: u64, denominator: u64) -> Result<Self> {
        if numerator == 0 || denominator == 0 {
            return Err(XenError::InvalidFraction {
                numerator,
                denominator,
            });
        }
        Ok(Self {
            rate: Some(numerator as f64 / denominator as f64),
            ..Self::default()
        })
    }

    fn validate(&self, index: usize) -> Result<()> {
        if let Some(rate) = self.rate {
            if rate <= 0.0 || !rate.is_finite() {
                return Err(XenError::TweakRateNotPositive { index, rate });
            }
        }
        if let Some(amplitude) = self.amplitude {
            if amplitude < 0.0 || !amplitude.is_finite() {
                return Err(XenError::TweakAmplitudeNegative { index, amplitude });
            }
        }
        if let Some(phase) = self.phase {
            if phase < 0.0 || !phase.is_finite() {
                return Err(XenError::TweakPhaseNegative { index, phase });
            }
        }
        Ok(())
    }

    fn apply(&self, partial: &Partial) -> Partial {
        Partial {
            rate: self.rate.map_or(partial.rate, |t| partial.rate * t),
            amplitude: self.amplitude.map_or(partial.amplitude, |t| partial.amplitude * t),
            phase: match (partial.phase, self.phase) {
                (Some(phase), Some(t)) => Some((phase * t).rem_euclid(1.0)),
                (phase, _) => phase,
            },
        }
    }
}

/// Apply positional tweaks to a partial sequence
///
/// Every tweak is validated before any is applied, so a single bad entry
/// fails the whole operation.
///
/// # Errors
/// `TweakLengthMismatch` when the lists differ in length, or the first
/// invalid tweak value found.
pub fn tweak(partials: &[Partial], tweaks: &[Tweak]) -> Result<Vec<Partial>> {
    if tweaks.len() != partials.len() {
        return Err(XenError::TweakLengthMismatch {
            tweaks: tweaks.len(),
            partials: partials.len(),
        });
    }

    for (index, t) in tweaks.iter().enumerate() {
        t.validate(index)?;
    }

    Ok(partials
        .iter()
        .zip(tweaks)
        .map(|(partial, t)| t.apply(partial))
        .collect())
}

// ============================================================================
// Phases
// ============================================================================

/// Give every partial an independent phase drawn uniformly from [0, 1)
///
/// The random source is injected so callers control determinism.
pub fn attach_random_phases<R: Rng + ?Sized>(partials: &[Partial], rng: &mut R) -> Vec<Partial> {
    partials
        .iter()
        .map(|p| Partial {
            phase: Some(rng.random::<f64>()),
            ..*p
        })
        .collect()
}
