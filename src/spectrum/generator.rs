//! Partial Series Generator
//!
//! Produces ordered, duplicate-free partial series from a small parameter
//! set: harmonic (optionally over a pseudo-octave), equal divisions of a
//! pseudo-octave, and stretched series.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::partial::{cents_to_ratio, round_to, Partial, PRECISION, RATE_EPSILON};
use crate::error::{Result, XenError};

// ============================================================================
// Constants
// ============================================================================

/// Iteration ceiling for equal-division snapping
pub const MAX_ITERATIONS: u64 = 1_000_000;

/// Default amplitude roll-off (1 = sawtooth-like 1/n profile)
pub const DEFAULT_AMPLITUDE_SLOPE: f64 = 1.0;

/// Default pseudo-octave (a pure 2:1 octave)
pub const DEFAULT_PSEUDO_OCTAVE_CENTS: f64 = 1200.0;

/// Default number of equal divisions per pseudo-octave
pub const DEFAULT_DIVISIONS: u32 = 12;

/// Upper bound on the up-front allocation for a series
const PREALLOCATE_LIMIT: usize = 4096;

// ============================================================================
// Options
// ============================================================================

/// Kind of partial series to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeriesKind {
    /// `rate(n) = pseudoOctave ^ log2(n)`
    #[default]
    Harmonic,
    /// Harmonic exponents snapped to `divisions` steps per pseudo-octave
    EqualDivision,
    /// `rate(n) = stretchFactor ^ log2(n)`
    Stretched,
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKind::Harmonic => write!(f, "harmonic"),
            SeriesKind::EqualDivision => write!(f, "equal-division"),
            SeriesKind::Stretched => write!(f, "stretched"),
        }
    }
}

/// Parameters of a partial series
///
/// `count` is a plain number because it arrives from UI controls as one;
/// negative and fractional counts are rejected by [`generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeriesOptions {
    #[serde(rename = "type")]
    pub kind: SeriesKind,
    pub count: f64,
    pub fundamental_rate: f64,
    pub amplitude_slope: f64,
    pub pseudo_octave_cents: f64,
    pub divisions: u32,
    pub stretch_factor: f64,
    /// Index of the first harmonic (1 = fundamental)
    pub start: u32,
    /// Generation stops once a rate exceeds this ratio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio_limit: Option<f64>,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        Self {
            kind: SeriesKind::Harmonic,
            count: 0.0,
            fundamental_rate: 1.0,
            amplitude_slope: DEFAULT_AMPLITUDE_SLOPE,
            pseudo_octave_cents: DEFAULT_PSEUDO_OCTAVE_CENTS,
            divisions: DEFAULT_DIVISIONS,
            stretch_factor: 2.0,
            start: 1,
            ratio_limit: None,
        }
    }
}

impl SeriesOptions {
    /// Harmonic series with `count` partials and default settings
    pub fn harmonic(count: usize) -> Self {
        Self {
            count: count as f64,
            ..Self::default()
        }
    }

    /// Equal division of the pseudo-octave into `divisions` steps
    pub fn equal_division(count: usize, divisions: u32) -> Self {
        Self {
            kind: SeriesKind::EqualDivision,
            count: count as f64,
            divisions,
            ..Self::default()
        }
    }

    /// Stretched series with the given stretch factor
    pub fn stretched(count: usize, stretch_factor: f64) -> Self {
        Self {
            kind: SeriesKind::Stretched,
            count: count as f64,
            stretch_factor,
            ..Self::default()
        }
    }

    pub fn with_slope(mut self, slope: f64) -> Self {
        self.amplitude_slope = slope;
        self
    }

    pub fn with_pseudo_octave_cents(mut self, cents: f64) -> Self {
        self.pseudo_octave_cents = cents;
        self
    }

    pub fn with_ratio_limit(mut self, limit: f64) -> Self {
        self.ratio_limit = Some(limit);
        self
    }

    /// Pseudo-octave expressed as a frequency ratio
    pub fn pseudo_octave_ratio(&self) -> f64 {
        cents_to_ratio(self.pseudo_octave_cents)
    }

    /// Validate the options, reporting the first violated constraint
    pub fn validate(&self) -> Result<()> {
        if self.count < 0.0 {
            return Err(XenError::NegativePartialCount { count: self.count });
        }
        if self.count.fract() != 0.0 || !self.count.is_finite() {
            return Err(XenError::NonIntegerPartialCount { count: self.count });
        }
        if !(self.amplitude_slope >= 0.0) || !self.amplitude_slope.is_finite() {
            return Err(XenError::NegativeAmplitudeSlope {
                slope: self.amplitude_slope,
            });
        }
        let octave = self.pseudo_octave_ratio();
        if !(octave > 1.0) || !octave.is_finite() {
            return Err(XenError::PseudoOctaveTooSmall { ratio: octave });
        }
        if self.kind == SeriesKind::Stretched
            && (!(self.stretch_factor > 1.0) || !self.stretch_factor.is_finite())
        {
            return Err(XenError::StretchFactorTooSmall {
                factor: self.stretch_factor,
            });
        }
        if !(self.fundamental_rate > 0.0) || !self.fundamental_rate.is_finite() {
            return Err(XenError::NonPositiveFundamental {
                rate: self.fundamental_rate,
            });
        }
        if self.kind == SeriesKind::EqualDivision && self.divisions == 0 {
            return Err(XenError::ZeroDivisions);
        }
        if self.start == 0 {
            return Err(XenError::InvalidPartial {
                reason: "series must start at the first harmonic or above".to_string(),
            });
        }
        Ok(())
    }

    fn base(&self) -> f64 {
        match self.kind {
            SeriesKind::Harmonic | SeriesKind::EqualDivision => self.pseudo_octave_ratio(),
            SeriesKind::Stretched => self.stretch_factor,
        }
    }

    fn exponent(&self, n: u64) -> f64 {
        let octaves = (n as f64).log2();
        match self.kind {
            SeriesKind::EqualDivision => {
                let steps = self.divisions as f64;
                (octaves * steps).round() / steps
            }
            SeriesKind::Harmonic | SeriesKind::Stretched => octaves,
        }
    }
}

// ============================================================================
// Generation
// ============================================================================

/// Amplitude of a partial at `rate` for a roll-off `slope`
///
/// Sub-fundamental partials are silent.
#[inline]
pub fn amplitude_for_rate(rate: f64, slope: f64) -> f64 {
    if rate < 1.0 {
        0.0
    } else if slope == 0.0 {
        1.0
    } else {
        rate.powf(-slope)
    }
}

/// Generate a partial series
///
/// # Returns
/// Partials sorted ascending by rate, without duplicates.
///
/// # Errors
/// Any validation failure of `options`, or `ProbableInfiniteLoop` when an
/// equal-division series cannot produce `count` unique rates within
/// [`MAX_ITERATIONS`] candidates.
pub fn generate(options: &SeriesOptions) -> Result<Vec<Partial>> {
    options.validate()?;

    let count = options.count as usize;
    let mut partials: Vec<Partial> = Vec::with_capacity(count.min(PREALLOCATE_LIMIT));
    if count == 0 {
        return Ok(partials);
    }

    let base = options.base();
    let guarded = options.kind == SeriesKind::EqualDivision;
    let mut n = options.start as u64;
    let mut iterations: u64 = 0;

    while partials.len() < count {
        if guarded && iterations >= MAX_ITERATIONS {
            return Err(XenError::ProbableInfiniteLoop { iterations });
        }
        iterations += 1;

        let rate = round_to(
            options.fundamental_rate * base.powf(options.exponent(n)),
            PRECISION,
        );
        n += 1;

        if matches!(options.ratio_limit, Some(limit) if rate > limit) {
            break;
        }

        let repeats_previous = partials
            .last()
            .is_some_and(|previous| (previous.rate - rate).abs() <= RATE_EPSILON);
        if repeats_previous {
            continue;
        }

        partials.push(Partial {
            rate,
            amplitude: amplitude_for_rate(rate, options.amplitude_slope),
            phase: None,
        });
    }

    tracing::trace!(
        kind = %options.kind,
        partials = partials.len(),
        iterations,
        "generated partial series"
    );

    Ok(partials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    fn rates(partials: &[Partial]) -> Vec<f64> {
        partials.iter().map(|p| p.rate).collect()
    }

    #[test]
    fn test_harmonic_four_partials_default_slope() {
        let partials = generate(&SeriesOptions::harmonic(4)).unwrap();

        assert_eq!(rates(&partials), vec![1.0, 2.0, 3.0, 4.0]);
        let expected = [1.0, 0.5, 1.0 / 3.0, 0.25];
        for (p, amp) in partials.iter().zip(expected) {
            assert_relative_eq!(p.amplitude, amp, epsilon = 1e-12);
            assert!(p.phase.is_none());
        }
    }

    #[test]
    fn test_harmonic_zero_partials() {
        let partials = generate(&SeriesOptions::harmonic(0)).unwrap();
        assert!(partials.is_empty());
    }

    #[test]
    fn test_harmonic_equal_amplitudes_when_slope_zero() {
        let partials = generate(&SeriesOptions::harmonic(5).with_slope(0.0)).unwrap();
        assert!(partials.iter().all(|p| p.amplitude == 1.0));
    }

    #[test_case(1200.0 ; "pure octave")]
    #[test_case(1800.0 ; "wide pseudo-octave")]
    #[test_case(1100.0 ; "narrow pseudo-octave")]
    fn test_harmonic_rate_law(cents: f64) {
        let options = SeriesOptions::harmonic(16)
            .with_pseudo_octave_cents(cents)
            .with_slope(1.5);
        let octave = options.pseudo_octave_ratio();
        let partials = generate(&options).unwrap();

        assert_eq!(partials.len(), 16);
        for (i, p) in partials.iter().enumerate() {
            let n = (i + 1) as f64;
            let expected_rate = octave.powf(n.log2());
            assert_relative_eq!(p.rate, expected_rate, epsilon = 1e-9);
            assert_relative_eq!(p.amplitude, p.rate.powf(-1.5), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_sub_fundamental_partials_are_silent() {
        let options = SeriesOptions {
            fundamental_rate: 0.5,
            ..SeriesOptions::harmonic(3)
        };
        let partials = generate(&options).unwrap();

        assert_eq!(rates(&partials), vec![0.5, 1.0, 1.5]);
        assert_eq!(partials[0].amplitude, 0.0);
        assert_eq!(partials[1].amplitude, 1.0);
    }

    #[test]
    fn test_equal_division_twelve_steps() {
        let partials = generate(&SeriesOptions::equal_division(10, 12)).unwrap();

        assert_eq!(partials.len(), 10);
        assert_eq!(partials[0].rate, 1.0);
        assert_eq!(partials[1].rate, 2.0);
        // 3 snaps to 19 semitones
        assert_relative_eq!(partials[2].rate, 2f64.powf(19.0 / 12.0), epsilon = 1e-9);
        // 5 snaps to 28 semitones
        assert_relative_eq!(partials[4].rate, 2f64.powf(28.0 / 12.0), epsilon = 1e-9);
        assert!(partials.windows(2).all(|w| w[0].rate < w[1].rate));
    }

    #[test]
    fn test_equal_division_skips_duplicates() {
        // 3-EDO: 5 and 6 both snap close to each other but never repeat
        let partials = generate(&SeriesOptions::equal_division(8, 3).with_slope(0.0)).unwrap();

        assert_eq!(partials.len(), 8);
        assert!(partials.windows(2).all(|w| w[0].rate < w[1].rate));
        for p in &partials {
            let steps = p.rate.log2() * 3.0;
            assert_relative_eq!(steps, steps.round(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_ratio_limit_stops_generation() {
        let partials =
            generate(&SeriesOptions::equal_division(1000, 3).with_ratio_limit(16.0)).unwrap();

        assert_eq!(partials.len(), 10);
        assert_eq!(partials.last().unwrap().rate, 16.0);
    }

    #[test]
    fn test_equal_division_infinite_loop_guard() {
        let err = generate(&SeriesOptions::equal_division(30, 1)).unwrap_err();
        assert!(matches!(err, XenError::ProbableInfiniteLoop { .. }));
    }

    #[test]
    fn test_huge_equal_division_count_fails_cleanly() {
        let options = SeriesOptions {
            count: 1e12,
            ..SeriesOptions::equal_division(0, 12)
        };
        assert_eq!(
            generate(&options),
            Err(XenError::ProbableInfiniteLoop {
                iterations: MAX_ITERATIONS
            })
        );
    }

    #[test]
    fn test_ceiling_only_guards_equal_division() {
        let count = MAX_ITERATIONS as usize + 1;
        let partials = generate(&SeriesOptions::harmonic(count).with_slope(0.0)).unwrap();
        assert_eq!(partials.len(), count);
    }

    #[test]
    fn test_stretched_series() {
        let partials = generate(&SeriesOptions::stretched(4, 2.1)).unwrap();

        assert_eq!(partials[0].rate, 1.0);
        assert_relative_eq!(partials[1].rate, 2.1, epsilon = 1e-9);
        assert_relative_eq!(partials[3].rate, 2.1 * 2.1, epsilon = 1e-9);
    }

    #[test]
    fn test_start_skips_lower_harmonics() {
        let options = SeriesOptions {
            start: 3,
            ..SeriesOptions::harmonic(2)
        };
        assert_eq!(rates(&generate(&options).unwrap()), vec![3.0, 4.0]);
    }

    #[test]
    fn test_validation_errors() {
        let negative = SeriesOptions {
            count: -1.0,
            ..SeriesOptions::default()
        };
        assert!(matches!(
            generate(&negative),
            Err(XenError::NegativePartialCount { .. })
        ));

        let fractional = SeriesOptions {
            count: 2.5,
            ..SeriesOptions::default()
        };
        assert!(matches!(
            generate(&fractional),
            Err(XenError::NonIntegerPartialCount { .. })
        ));

        assert!(matches!(
            generate(&SeriesOptions::harmonic(4).with_slope(-1.0)),
            Err(XenError::NegativeAmplitudeSlope { .. })
        ));

        assert!(matches!(
            generate(&SeriesOptions::harmonic(4).with_pseudo_octave_cents(0.0)),
            Err(XenError::PseudoOctaveTooSmall { .. })
        ));

        assert!(matches!(
            generate(&SeriesOptions::stretched(4, 0.9)),
            Err(XenError::StretchFactorTooSmall { .. })
        ));

        assert!(matches!(
            generate(&SeriesOptions::equal_division(4, 0)),
            Err(XenError::ZeroDivisions)
        ));
    }

    #[test]
    fn test_nan_options_are_rejected() {
        let nan_fundamental = SeriesOptions {
            fundamental_rate: f64::NAN,
            ..SeriesOptions::harmonic(4)
        };
        assert!(matches!(
            generate(&nan_fundamental),
            Err(XenError::NonPositiveFundamental { .. })
        ));

        assert!(matches!(
            generate(&SeriesOptions::harmonic(4).with_slope(f64::NAN)),
            Err(XenError::NegativeAmplitudeSlope { .. })
        ));

        assert!(matches!(
            generate(&SeriesOptions::harmonic(4).with_pseudo_octave_cents(f64::NAN)),
            Err(XenError::PseudoOctaveTooSmall { .. })
        ));

        assert!(matches!(
            generate(&SeriesOptions::stretched(4, f64::NAN)),
            Err(XenError::StretchFactorTooSmall { .. })
        ));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: SeriesOptions =
            serde_json::from_str(r#"{"type":"equal-division","count":5,"divisions":19}"#).unwrap();

        assert_eq!(options.kind, SeriesKind::EqualDivision);
        assert_eq!(options.divisions, 19);
        assert_eq!(options.fundamental_rate, 1.0);
        assert_eq!(options.amplitude_slope, DEFAULT_AMPLITUDE_SLOPE);
    }
}
