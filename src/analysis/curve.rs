//! Dissonance Curves
//!
//! Sweeps a copy of a spectrum against itself over a range of intervals and
//! records the total roughness at every step. Curves are detrended against
//! the line through their end points and normalized so the dominant extremum
//! is ±1.

use serde::{Deserialize, Serialize};

use super::dissonance::{intrinsic_dissonance, sounding};
use super::tuning;
use crate::error::{Result, XenError};
use crate::spectrum::{cents_to_ratio, combine_absolute, ratio_to_cents, shift, Partial};

// ============================================================================
// Constants
// ============================================================================

/// Default sweep fundamental in Hz (middle C)
pub const DEFAULT_FUNDAMENTAL: f64 = 261.63;

/// Default number of points in a one-octave sweep (one per cent)
pub const DEFAULT_POINTS: usize = 1201;

// ============================================================================
// Curve Points
// ============================================================================

/// A position on the sweep axis in its three equivalent encodings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPosition {
    pub cents: f64,
    pub ratio: f64,
    /// Absolute frequency of the sweeping copy's fundamental
    pub hz: f64,
}

impl SweepPosition {
    pub fn from_ratio(ratio: f64, fundamental: f64) -> Self {
        Self {
            cents: ratio_to_cents(ratio),
            ratio,
            hz: fundamental * ratio,
        }
    }

    pub fn from_cents(cents: f64, fundamental: f64) -> Self {
        let ratio = cents_to_ratio(cents);
        Self {
            cents,
            ratio,
            hz: fundamental * ratio,
        }
    }
}

/// One sample of a dissonance curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DissonancePoint {
    /// Interval of the sweeping copy in cents
    pub cents: f64,
    /// Interval of the sweeping copy as a ratio
    pub ratio: f64,
    /// Absolute frequency of the sweeping copy's fundamental
    pub hz: f64,
    pub value: f64,
}

impl DissonancePoint {
    pub fn new(cents: f64, fundamental: f64, value: f64) -> Self {
        let SweepPosition { cents, ratio, hz } = SweepPosition::from_cents(cents, fundamental);
        Self {
            cents,
            ratio,
            hz,
            value,
        }
    }

    pub fn position(&self) -> SweepPosition {
        SweepPosition {
            cents: self.cents,
            ratio: self.ratio,
            hz: self.hz,
        }
    }
}

/// Subtract the straight line through the first and last points
///
/// The line is taken over `ratio`. Curves with fewer than two points, or with
/// coincident end ratios, are returned unchanged.
pub fn detrend(points: &[DissonancePoint]) -> Vec<DissonancePoint> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return points.to_vec();
    };

    let run = last.ratio - first.ratio;
    if points.len() < 2 || run == 0.0 {
        return points.to_vec();
    }

    let slope = (last.value - first.value) / run;
    points
        .iter()
        .map(|p| DissonancePoint {
            value: p.value - (first.value + slope * (p.ratio - first.ratio)),
            ..*p
        })
        .collect()
}

/// Divide by the magnitude of the largest-magnitude value
///
/// An all-zero curve is returned unchanged.
pub fn normalize(points: &[DissonancePoint]) -> Vec<DissonancePoint> {
    let peak = points.iter().fold(0.0f64, |acc, p| acc.max(p.value.abs()));
    if peak == 0.0 {
        return points.to_vec();
    }

    points
        .iter()
        .map(|p| DissonancePoint {
            value: p.value / peak,
            ..*p
        })
        .collect()
}

// ============================================================================
// Dissonance Curve
// ============================================================================

/// A computed dissonance curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DissonanceCurve {
    pub points: Vec<DissonancePoint>,
    /// Periodicity of the swept spectrum, 2:1 when none is found
    pub pseudo_octave: SweepPosition,
}

impl DissonanceCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Local minima of the curve, in sweep order
    ///
    /// An interior point is a minimum when it is strictly below its left
    /// neighbour and not above its right one. End points count when they are
    /// strictly below their only neighbour.
    pub fn minima(&self) -> Vec<DissonancePoint> {
        let points = &self.points;
        let n = points.len();
        if n < 2 {
            return points.clone();
        }

        let mut minima = Vec::new();
        if points[0].value < points[1].value {
            minima.push(points[0]);
        }
        for window in points.windows(3) {
            let [left, mid, right] = window else { continue };
            if mid.value < left.value && mid.value <= right.value {
                minima.push(*mid);
            }
        }
        if points[n - 1].value < points[n - 2].value {
            minima.push(points[n - 1]);
        }

        minima
    }

    /// Render as tab-separated text with a header row
    pub fn to_tsv(&self) -> String {
        let mut out = String::from("cents\tratio\thz\tvalue\n");
        for p in &self.points {
            out.push_str(&format!("{}\t{}\t{}\t{}\n", p.cents, p.ratio, p.hz, p.value));
        }
        out
    }
}

// ============================================================================
// Sweeps
// ============================================================================

/// Options for a single sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurveOptions {
    /// Frequency of the stationary copy's fundamental in Hz
    pub fundamental: f64,
    pub points: usize,
    pub start_cents: f64,
    pub step_cents: f64,
    pub detrended: bool,
    pub normalized: bool,
}

impl Default for CurveOptions {
    fn default() -> Self {
        Self {
            fundamental: DEFAULT_FUNDAMENTAL,
            points: DEFAULT_POINTS,
            start_cents: 0.0,
            step_cents: 1.0,
            detrended: true,
            normalized: true,
        }
    }
}

impl CurveOptions {
    pub fn validate(&self) -> Result<()> {
        if self.points == 0 {
            return Err(XenError::InvalidSweep {
                reason: "number of points should be greater than zero".to_string(),
            });
        }
        if !(self.fundamental > 0.0) || !self.fundamental.is_finite() {
            return Err(XenError::InvalidSweep {
                reason: format!("fundamental should be greater than zero, got {}", self.fundamental),
            });
        }
        if !self.start_cents.is_finite() || !self.step_cents.is_finite() {
            return Err(XenError::InvalidSweep {
                reason: "start and step should be finite".to_string(),
            });
        }
        Ok(())
    }
}

/// Sweep points of a spectrum against itself, post-processed per `options`
fn sweep(partials: &[Partial], fundamental: f64, options: &CurveOptions) -> Result<Vec<DissonancePoint>> {
    options.validate()?;
    for partial in partials {
        partial.validate()?;
    }

    let stationary = shift(partials, fundamental)?;

    let mut points = Vec::with_capacity(options.points);
    for i in 0..options.points {
        let cents = options.start_cents + options.step_cents * i as f64;
        let mut point = DissonancePoint::new(cents, fundamental, 0.0);

        let sweeping = shift(partials, point.hz)?;
        let merged = combine_absolute(&[&stationary, &sweeping]);
        point.value = intrinsic_dissonance(&sounding(&merged.partials, merged.fundamental));

        points.push(point);
    }

    tracing::trace!(
        points = points.len(),
        start = options.start_cents,
        step = options.step_cents,
        "swept dissonance curve"
    );

    if options.detrended {
        points = detrend(&points);
    }
    if options.normalized {
        points = normalize(&points);
    }
    Ok(points)
}

/// Sweep a spectrum against itself
///
/// At step `i` the sweeping copy sits `start + step·i` cents above the
/// stationary copy. Both copies are merged (coincident partials sum their
/// amplitudes) and the total roughness of the merged set is recorded. The
/// curve carries the spectrum's pseudo-octave from the tuning analysis.
///
/// # Errors
/// `InvalidSweep` for bad options, or the partial's own validation error.
pub fn dissonance_curve(partials: &[Partial], options: &CurveOptions) -> Result<DissonanceCurve> {
    let points = sweep(partials, options.fundamental, options)?;
    let octave = tuning::analyze(partials).pseudo_octave_ratio();

    Ok(DissonanceCurve {
        points,
        pseudo_octave: SweepPosition::from_ratio(octave, options.fundamental),
    })
}

/// Sweep one pseudo-octave of a spectrum from unison
///
/// The pseudo-octave comes from the tuning analysis and falls back to 2/1.
///
/// # Errors
/// `InvalidSweep` if fewer than two points are requested.
pub fn dissonance_curve_for_spectrum(
    partials: &[Partial],
    points: usize,
    fundamental: f64,
) -> Result<DissonanceCurve> {
    if points < 2 {
        return Err(XenError::InvalidSweep {
            reason: format!("a pseudo-octave sweep needs at least two points, got {points}"),
        });
    }

    let octave = tuning::analyze(partials).pseudo_octave_ratio();
    let pseudo_octave = SweepPosition::from_ratio(octave, fundamental);

    let options = CurveOptions {
        fundamental,
        points,
        start_cents: 0.0,
        step_cents: pseudo_octave.cents / (points - 1) as f64,
        ..CurveOptions::default()
    };

    Ok(DissonanceCurve {
        points: sweep(partials, fundamental, &options)?,
        pseudo_octave,
    })
}

// ============================================================================
// Multi-octave Sweeps
// ============================================================================

/// Optional inclusive bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinMax {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl MinMax {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Partial filters applied before a multi-octave sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub amplitude: MinMax,
    /// Absolute frequency in Hz over the sweep fundamental
    pub frequency: MinMax,
    /// 1-based position of the partial in the input
    pub index: MinMax,
}

impl Limits {
    /// Keep the partials that satisfy every bound
    pub fn apply(&self, partials: &[Partial], fundamental: f64) -> Vec<Partial> {
        partials
            .iter()
            .enumerate()
            .filter(|(i, p)| {
                self.amplitude.contains(p.amplitude)
                    && self.frequency.contains(p.frequency(fundamental))
                    && self.index.contains((*i + 1) as f64)
            })
            .map(|(_, p)| *p)
            .collect()
    }
}

/// Options for a sweep spanning several pseudo-octaves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MultiOctaveOptions {
    pub fundamental: f64,
    /// Points per pseudo-octave; one per cent when unset
    pub points: Option<usize>,
    /// Pseudo-octave range `[first, last)`; when unset, from one pseudo-octave
    /// below unison up to the one holding the highest partial
    pub octaves: Option<(i32, i32)>,
    pub limits: Limits,
    /// Pseudo-octave ratio; taken from the tuning analysis when unset
    pub pseudo_octave: Option<f64>,
    pub detrended: bool,
}

impl Default for MultiOctaveOptions {
    fn default() -> Self {
        Self {
            fundamental: DEFAULT_FUNDAMENTAL,
            points: None,
            octaves: None,
            limits: Limits::default(),
            pseudo_octave: None,
            detrended: true,
        }
    }
}

/// Default pseudo-octave range for a spectrum whose highest rate is `highest`
///
/// Starts one pseudo-octave below unison and ends after the pseudo-octave
/// that contains `highest`. A rate sitting exactly on a pseudo-octave
/// boundary opens the next one.
fn default_octaves(highest: f64, octave: f64) -> (i32, i32) {
    let span = (highest.ln() / octave.ln() + 1e-9).floor();
    let last = if span.is_finite() && span >= 0.0 {
        span as i32 + 1
    } else {
        1
    };
    (-1, last)
}

/// Sweep a spectrum across several contiguous pseudo-octaves
///
/// Partials are filtered by `limits` and merged first; the sweep stays at the
/// real frequency of the lowest kept partial. Every pseudo-octave is
/// swept as its own segment (detrended when requested, never normalized on
/// its own); segments are joined without repeating the shared boundary
/// point, and the joined curve is normalized as a whole.
///
/// # Errors
/// `InvalidSweep` for an empty octave range, fewer than two points per
/// segment, or a pseudo-octave not above 1.
pub fn multi_octave_curve(partials: &[Partial], options: &MultiOctaveOptions) -> Result<DissonanceCurve> {
    let kept = combine_absolute(&[&options.limits.apply(partials, options.fundamental)]);
    let fundamental = options.fundamental * kept.fundamental;
    let filtered = kept.partials;

    let octave = match options.pseudo_octave {
        Some(ratio) => ratio,
        None => tuning::analyze(&filtered).pseudo_octave_ratio(),
    };
    if !(octave > 1.0) || !octave.is_finite() {
        return Err(XenError::InvalidSweep {
            reason: format!("pseudo-octave should be greater than one, got {octave}"),
        });
    }
    let octave_cents = ratio_to_cents(octave);

    let points = options
        .points
        .unwrap_or_else(|| octave_cents.round() as usize + 1);
    if points < 2 {
        return Err(XenError::InvalidSweep {
            reason: format!("each pseudo-octave needs at least two points, got {points}"),
        });
    }

    let (first, last) = match options.octaves {
        Some(range) => range,
        None => {
            let highest = filtered.last().map_or(1.0, |p| p.rate);
            default_octaves(highest, octave)
        }
    };
    if last <= first {
        return Err(XenError::InvalidSweep {
            reason: format!("octave range [{first}, {last}) is empty"),
        });
    }

    let step_cents = octave_cents / (points - 1) as f64;
    let mut joined: Vec<DissonancePoint> = Vec::with_capacity(points * (last - first) as usize);

    for (segment, k) in (first..last).enumerate() {
        let segment_options = CurveOptions {
            fundamental,
            points,
            start_cents: k as f64 * octave_cents,
            step_cents,
            detrended: options.detrended,
            normalized: false,
        };
        let points = sweep(&filtered, fundamental, &segment_options)?;
        let skip = usize::from(segment > 0);
        joined.extend(points.into_iter().skip(skip));
    }

    tracing::debug!(
        octave,
        segments = last - first,
        points = joined.len(),
        "swept multi-octave curve"
    );

    Ok(DissonanceCurve {
        points: normalize(&joined),
        pseudo_octave: SweepPosition::from_ratio(octave, fundamental),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::dissonance::SoundingPartial;
    use crate::spectrum::{generate, SeriesOptions};
    use approx::assert_relative_eq;
    use test_case::test_case;

    /// 21 points with ratio 1 + i/20 and cents 60·i
    fn grid(f: impl Fn(f64) -> f64) -> Vec<DissonancePoint> {
        (0..21)
            .map(|i| {
                let ratio = 1.0 + i as f64 / 20.0;
                DissonancePoint {
                    cents: 60.0 * i as f64,
                    ratio,
                    hz: ratio * 20.0,
                    value: f(ratio),
                }
            })
            .collect()
    }

    fn harmonic(count: usize) -> Vec<Partial> {
        generate(&SeriesOptions::harmonic(count)).unwrap()
    }

    #[test]
    fn test_detrend_linear_is_zero() {
        for p in detrend(&grid(|x| 3.0 * x - 7.0)) {
            assert_relative_eq!(p.value, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_detrend_parabola() {
        let detrended = detrend(&grid(|x| x * x + 1.0));
        for p in detrended {
            assert_relative_eq!(p.value, p.ratio * p.ratio - 3.0 * p.ratio + 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_detrend_short_curves_unchanged() {
        let single = grid(|x| x)[..1].to_vec();
        assert_eq!(detrend(&single), single);
        assert!(detrend(&[]).is_empty());
    }

    #[test_case(1.0 ; "positive peak")]
    #[test_case(-1.0 ; "negative peak")]
    fn test_normalize_peak(sign: f64) {
        let normalized = normalize(&grid(|x| sign * (x * x + 1.0)));
        let peak = normalized.iter().map(|p| p.value).fold(0.0f64, |a, v| a.max(v.abs()));
        assert_relative_eq!(peak, 1.0);
        assert_relative_eq!(normalized.last().unwrap().value, sign);
    }

    #[test]
    fn test_normalize_all_zero_unchanged() {
        let zeros = grid(|_| 0.0);
        assert_eq!(normalize(&zeros), zeros);
    }

    #[test]
    fn test_unison_point_matches_merged_spectrum() {
        let partials = harmonic(4);
        let options = CurveOptions {
            points: 3,
            detrended: false,
            normalized: false,
            ..CurveOptions::default()
        };
        let curve = dissonance_curve(&partials, &options).unwrap();

        let doubled: Vec<SoundingPartial> = partials
            .iter()
            .map(|p| SoundingPartial::new(p.rate * DEFAULT_FUNDAMENTAL, p.amplitude * 2.0))
            .collect();
        assert_relative_eq!(
            curve.points[0].value,
            intrinsic_dissonance(&doubled),
            max_relative = 1e-9
        );
        assert_relative_eq!(curve.points[1].cents, 1.0);
    }

    #[test]
    fn test_harmonic_curve_has_fifth_minimum() {
        let curve = dissonance_curve(&harmonic(6), &CurveOptions::default()).unwrap();

        assert_eq!(curve.len(), DEFAULT_POINTS);
        assert_relative_eq!(curve.points[0].value, 0.0, epsilon = 1e-12);
        let peak = curve.values().iter().fold(0.0f64, |a, v| a.max(v.abs()));
        assert_relative_eq!(peak, 1.0);

        let minima = curve.minima();
        assert!(minima.iter().any(|p| (p.cents - 702.0).abs() <= 1.0));
    }

    #[test]
    fn test_curve_for_spectrum_uses_pseudo_octave() {
        let curve = dissonance_curve_for_spectrum(&harmonic(6), 121, DEFAULT_FUNDAMENTAL).unwrap();
        assert_relative_eq!(curve.pseudo_octave.ratio, 2.0);
        assert_relative_eq!(curve.pseudo_octave.cents, 1200.0, epsilon = 1e-9);
        assert_relative_eq!(curve.pseudo_octave.hz, 2.0 * DEFAULT_FUNDAMENTAL);
        assert_eq!(curve.len(), 121);
        assert_relative_eq!(curve.points.last().unwrap().cents, 1200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_partial_falls_back_to_octave() {
        let curve = dissonance_curve_for_spectrum(&harmonic(1), 101, DEFAULT_FUNDAMENTAL).unwrap();
        assert_eq!(
            curve.pseudo_octave,
            SweepPosition::from_ratio(2.0, DEFAULT_FUNDAMENTAL)
        );
        assert_relative_eq!(curve.pseudo_octave.cents, 1200.0, epsilon = 1e-9);
        assert!(curve.values().iter().all(|v| v.is_finite()));
        assert_relative_eq!(curve.points[0].value, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_plain_sweep_reports_pseudo_octave() {
        let options = CurveOptions {
            fundamental: 440.0,
            points: 5,
            ..CurveOptions::default()
        };
        let curve = dissonance_curve(&harmonic(4), &options).unwrap();
        assert_relative_eq!(curve.pseudo_octave.ratio, 2.0);
        assert_relative_eq!(curve.pseudo_octave.hz, 880.0);

        let single = dissonance_curve(&harmonic(1), &options).unwrap();
        assert_relative_eq!(single.pseudo_octave.ratio, 2.0);
    }

    #[test]
    fn test_sweep_position_encodings_agree() {
        let from_ratio = SweepPosition::from_ratio(1.5, 200.0);
        let from_cents = SweepPosition::from_cents(from_ratio.cents, 200.0);

        assert_relative_eq!(from_ratio.hz, 300.0);
        assert_relative_eq!(from_cents.ratio, 1.5, epsilon = 1e-12);
        assert_relative_eq!(from_cents.hz, 300.0, epsilon = 1e-9);
        assert_eq!(
            DissonancePoint::new(700.0, 100.0, 0.0).position(),
            SweepPosition::from_cents(700.0, 100.0)
        );
    }

    #[test]
    fn test_invalid_sweeps() {
        let options = CurveOptions {
            points: 0,
            ..CurveOptions::default()
        };
        assert!(matches!(
            dissonance_curve(&harmonic(2), &options),
            Err(XenError::InvalidSweep { .. })
        ));
        assert!(dissonance_curve_for_spectrum(&harmonic(2), 1, 440.0).is_err());
    }

    #[test]
    fn test_multi_octave_default_range() {
        let curve = multi_octave_curve(&harmonic(6), &MultiOctaveOptions::default()).unwrap();

        // One octave below unison, then up to the octave holding rate 6
        assert_eq!(curve.len(), 1201 + 3 * 1200);
        assert_relative_eq!(curve.points[0].cents, -1200.0, epsilon = 1e-9);
        assert!(curve.points.windows(2).all(|w| w[0].cents < w[1].cents));
        let peak = curve.values().iter().fold(0.0f64, |a, v| a.max(v.abs()));
        assert_relative_eq!(peak, 1.0);
    }

    #[test]
    fn test_multi_octave_explicit_range_and_points() {
        let options = MultiOctaveOptions {
            points: Some(13),
            octaves: Some((0, 2)),
            ..MultiOctaveOptions::default()
        };
        let curve = multi_octave_curve(&harmonic(6), &options).unwrap();
        assert_eq!(curve.len(), 25);
        assert_relative_eq!(curve.points[12].cents, 1200.0, epsilon = 1e-9);
        assert_relative_eq!(curve.points[24].cents, 2400.0, epsilon = 1e-9);
    }

    #[test]
    fn test_multi_octave_limits() {
        let options = MultiOctaveOptions {
            limits: Limits {
                index: MinMax::new(None, Some(2.0)),
                ..Limits::default()
            },
            points: Some(11),
            ..MultiOctaveOptions::default()
        };
        // Rate 2 sits on the octave boundary, so [-1, 2) is swept
        let curve = multi_octave_curve(&harmonic(6), &options).unwrap();
        assert_eq!(curve.len(), 11 + 2 * 10);

        let empty = MultiOctaveOptions {
            octaves: Some((1, 1)),
            ..MultiOctaveOptions::default()
        };
        assert!(multi_octave_curve(&harmonic(6), &empty).is_err());
    }

    #[test]
    fn test_limits_keep_real_frequencies() {
        let options = MultiOctaveOptions {
            limits: Limits {
                index: MinMax::new(Some(2.0), None),
                ..Limits::default()
            },
            points: Some(13),
            octaves: Some((0, 1)),
            pseudo_octave: Some(2.0),
            ..MultiOctaveOptions::default()
        };
        let curve = multi_octave_curve(&harmonic(6), &options).unwrap();

        // Without the fundamental the lowest kept partial sits at 2 · f0
        let upper: Vec<Partial> = harmonic(6)[1..]
            .iter()
            .map(|p| Partial::new(p.rate / 2.0, p.amplitude).unwrap())
            .collect();
        let expected = dissonance_curve(
            &upper,
            &CurveOptions {
                fundamental: 2.0 * DEFAULT_FUNDAMENTAL,
                points: 13,
                step_cents: 100.0,
                ..CurveOptions::default()
            },
        )
        .unwrap();

        assert_relative_eq!(curve.points[0].hz, 2.0 * DEFAULT_FUNDAMENTAL);
        assert_relative_eq!(curve.pseudo_octave.hz, 4.0 * DEFAULT_FUNDAMENTAL);
        assert_eq!(curve.len(), expected.len());
        for (got, want) in curve.points.iter().zip(&expected.points) {
            assert_relative_eq!(got.value, want.value, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_limits_filter() {
        let limits = Limits {
            amplitude: MinMax::new(Some(0.3), None),
            frequency: MinMax::new(None, Some(1000.0)),
            ..Limits::default()
        };
        let kept = limits.apply(&harmonic(6), 261.63);
        // amplitudes 1, 1/2, 1/3 pass; 3 · 261.63 Hz stays under 1000 Hz
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_tsv_export() {
        let curve = DissonanceCurve {
            points: grid(|x| x),
            pseudo_octave: SweepPosition::from_ratio(2.0, 20.0),
        };
        let tsv = curve.to_tsv();
        let mut lines = tsv.lines();
        assert_eq!(lines.next(), Some("cents\tratio\thz\tvalue"));
        assert_eq!(lines.count(), 21);
    }

    #[test]
    fn test_minima_of_parabola() {
        let curve = DissonanceCurve {
            points: grid(|x| (x - 1.5) * (x - 1.5)),
            pseudo_octave: SweepPosition::from_ratio(2.0, 20.0),
        };
        let minima = curve.minima();
        assert_eq!(minima.len(), 1);
        assert_relative_eq!(minima[0].ratio, 1.5);
    }
}
