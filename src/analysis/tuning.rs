//! Tuning Analyzer
//!
//! Derives the interval structure of a partial set: every pairwise ratio as a
//! reduced integer fraction with a correlation weight, and the pseudo-octave
//! at which that structure repeats.
//!
//! Rates are rounded to a fixed precision first so near-duplicate partials
//! count as one and do not fragment the interval table.

use serde::{Deserialize, Serialize};

use crate::spectrum::{round_to, Partial};

// ============================================================================
// Constants
// ============================================================================

/// Default number of decimal digits kept on partial rates
pub const DEFAULT_PRECISION: u32 = 3;

/// Ratio used when no pseudo-octave can be found
pub const FALLBACK_PSEUDO_OCTAVE: f64 = 2.0;

// ============================================================================
// Helper Functions
// ============================================================================

/// Smallest distinguishable step at a precision
#[inline]
fn tolerance(precision: u32) -> f64 {
    10f64.powi(-(precision as i32))
}

/// Rounded rates within one step are the same partial.
/// The slack absorbs the representation error of the rounded values.
#[inline]
fn same_rate(a: f64, b: f64, precision: u32) -> bool {
    (a - b).abs() <= tolerance(precision) * (1.0 + 1e-6)
}

#[inline]
fn same_ratio(a: f64, b: f64, precision: u32) -> bool {
    (a - b).abs() < tolerance(precision)
}

/// Folded ratios accumulate error proportional to their size
#[inline]
fn same_folded_ratio(a: f64, b: f64, precision: u32) -> bool {
    (a - b).abs() < tolerance(precision) * a.abs().max(b.abs()).max(1.0)
}

/// Greatest common divisor
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Reduce a fraction to lowest terms
///
/// # Example
/// ```
/// use xenspectra::analysis::tuning::reduce_fraction;
/// assert_eq!(reduce_fraction(28, 12), (7, 3));
/// ```
pub fn reduce_fraction(numerator: u64, denominator: u64) -> (u64, u64) {
    let divisor = gcd(numerator, denominator);
    if divisor == 0 {
        return (numerator, denominator);
    }
    (numerator / divisor, denominator / divisor)
}

/// Round partial rates and merge near-duplicates
///
/// Partials are sorted ascending, rates rounded to `precision` decimals, and
/// any partial within one step of the last kept partial is dropped. The first
/// partial of a merged run keeps its amplitude and phase. Rates that round to
/// zero are discarded.
pub fn round_partial_rates(partials: &[Partial], precision: u32) -> Vec<Partial> {
    let mut sorted = partials.to_vec();
    sorted.sort_by(|a, b| a.rate.total_cmp(&b.rate));

    let mut rounded: Vec<Partial> = Vec::with_capacity(sorted.len());
    for partial in sorted {
        let rate = round_to(partial.rate, precision as i32);
        if rate <= 0.0 {
            continue;
        }
        if rounded
            .last()
            .is_some_and(|last| same_rate(last.rate, rate, precision))
        {
            continue;
        }
        rounded.push(Partial { rate, ..partial });
    }

    rounded
}

// ============================================================================
// Tuning Entries
// ============================================================================

/// One interval found in a partial set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningEntry {
    /// Reduced fraction `(numerator, denominator)`
    pub fraction: (u64, u64),
    /// `numerator / denominator`
    pub ratio: f64,
    /// Accumulated occurrence weight in [0, 1]
    pub correlation: f64,
}

impl TuningEntry {
    fn new(fraction: (u64, u64), correlation: f64) -> Self {
        Self {
            fraction,
            ratio: fraction.0 as f64 / fraction.1 as f64,
            correlation,
        }
    }

    /// Interval size in cents
    pub fn cents(&self) -> f64 {
        crate::spectrum::ratio_to_cents(self.ratio)
    }
}

/// Collect all pairwise intervals of a partial set
///
/// Every ordered pair `(i, j)` is visited, including `i == j`, so the 1/1
/// identity always carries correlation 1. Each occurrence adds `1 / N` where
/// `N` is the number of partials left after rounding. Entries whose ratios
/// differ by less than one step are merged and keep the first fraction seen.
/// Entries are returned in discovery order.
pub fn interval_entries(partials: &[Partial], precision: u32) -> Vec<TuningEntry> {
    let rounded = round_partial_rates(partials, precision);
    if rounded.is_empty() {
        return Vec::new();
    }

    let scale = 10f64.powi(precision as i32);
    let scaled: Vec<u64> = rounded
        .iter()
        .map(|p| (p.rate * scale).round() as u64)
        .collect();
    let weight = 1.0 / scaled.len() as f64;

    let mut entries: Vec<TuningEntry> = Vec::new();
    for &numerator in &scaled {
        for &denominator in &scaled {
            let fraction = reduce_fraction(numerator, denominator);
            let ratio = fraction.0 as f64 / fraction.1 as f64;

            match entries
                .iter_mut()
                .find(|entry| same_ratio(entry.ratio, ratio, precision))
            {
                Some(entry) => entry.correlation += weight,
                None => entries.push(TuningEntry::new(fraction, weight)),
            }
        }
    }

    entries
}

// ============================================================================
// Pseudo-octave
// ============================================================================

/// Find the smallest ratio at which the interval structure repeats
///
/// Candidates are the distinct entry ratios above 1, smallest first. A
/// candidate `c` is accepted when dividing every larger interval by `c`
/// (repeatedly, until it no longer exceeds `c`) always lands on an interval
/// that already exists, and the folded set is strictly smaller than the
/// original one.
///
/// The smallest collapsing ratio wins even when a larger one would fold onto
/// the unison. A spectrum built from whole-tone steps of 12-EDO therefore
/// repeats at `2^(2/12)`, and a curve swept up to its pseudo-octave covers
/// 200 cents instead of 1200.
///
/// # Returns
/// The accepted entry, or `None` when the set has no periodicity.
pub fn find_pseudo_octave(entries: &[TuningEntry], precision: u32) -> Option<TuningEntry> {
    let step = tolerance(precision);
    let mut intervals: Vec<&TuningEntry> = entries.iter().filter(|e| e.ratio > 1.0 + step).collect();
    intervals.sort_by(|a, b| a.ratio.total_cmp(&b.ratio));

    let exists = |ratio: f64| {
        intervals
            .iter()
            .any(|entry| same_folded_ratio(entry.ratio, ratio, precision))
    };

    'candidates: for candidate in &intervals {
        let octave = candidate.ratio;
        let mut folded: Vec<f64> = Vec::with_capacity(intervals.len());

        for interval in &intervals {
            let mut ratio = interval.ratio;
            while ratio > octave * (1.0 + step) {
                ratio /= octave;
            }

            if !exists(ratio) {
                continue 'candidates;
            }
            if !folded
                .iter()
                .any(|&f| same_folded_ratio(f, ratio, precision))
            {
                folded.push(ratio);
            }
        }

        if folded.len() < intervals.len() {
            return Some((*candidate).clone());
        }
    }

    None
}

// ============================================================================
// Tuning
// ============================================================================

/// Interval table and pseudo-octave of a partial set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    pub entries: Vec<TuningEntry>,
    pub pseudo_octave: Option<TuningEntry>,
    pub precision: u32,
}

impl Tuning {
    /// Pseudo-octave ratio, or 2 if none was found
    pub fn pseudo_octave_ratio(&self) -> f64 {
        self.pseudo_octave
            .as_ref()
            .map_or(FALLBACK_PSEUDO_OCTAVE, |entry| entry.ratio)
    }

    /// Look up the entry for a reduced fraction
    pub fn entry(&self, numerator: u64, denominator: u64) -> Option<&TuningEntry> {
        let fraction = reduce_fraction(numerator, denominator);
        self.entries.iter().find(|e| e.fraction == fraction)
    }

    /// Intervals folded into one pseudo-octave, ascending, starting at 1
    pub fn scale(&self) -> Vec<f64> {
        let octave = self.pseudo_octave_ratio();
        let step = tolerance(self.precision);

        let mut steps: Vec<f64> = vec![1.0];
        for entry in self.entries.iter().filter(|e| e.ratio > 1.0 + step) {
            let mut ratio = entry.ratio;
            while ratio >= octave * (1.0 - step) {
                ratio /= octave;
            }
            if ratio <= 1.0 + step {
                continue;
            }
            if !steps
                .iter()
                .any(|&s| same_folded_ratio(s, ratio, self.precision))
            {
                steps.push(ratio);
            }
        }

        steps.sort_by(f64::total_cmp);
        steps
    }
}

/// Analyze a partial set at the default precision
pub fn analyze(partials: &[Partial]) -> Tuning {
    analyze_with_precision(partials, DEFAULT_PRECISION)
}

/// Analyze a partial set at an explicit precision
pub fn analyze_with_precision(partials: &[Partial], precision: u32) -> Tuning {
    let entries = interval_entries(partials, precision);
    let pseudo_octave = find_pseudo_octave(&entries, precision);

    tracing::debug!(
        intervals = entries.len(),
        pseudo_octave = pseudo_octave.as_ref().map(|e| e.ratio),
        "analyzed tuning"
    );

    Tuning {
        entries,
        pseudo_octave,
        precision,
    }
}
