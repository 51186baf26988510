//! Sensory dissonance model
//!
//! Plomp-Levelt roughness between pairs of sounding partials, with loudness
//! derived from amplitude. Everything here works in absolute frequency (Hz).

use serde::{Deserialize, Serialize};

use crate::spectrum::Partial;

/// Loudness of a partial from its linear amplitude
///
/// `0.25 · 2^log10(2e8 · amplitude)`. Zero or negative amplitude is silent.
#[inline]
pub fn loudness(amplitude: f64) -> f64 {
    if amplitude <= 0.0 {
        return 0.0;
    }
    0.25 * 2f64.powf((2e8 * amplitude).log10())
}

/// Roughness of two partials
///
/// # Arguments
/// * `min_loudness` - Loudness of the quieter partial
/// * `frequency_difference` - Distance between the partials in Hz
/// * `min_frequency` - Frequency of the lower partial in Hz
///
/// # Returns
/// `L · (e^(-0.84 s) - e^(-1.38 s))` with `s = Δf / (0.021 fmin + 19)`,
/// or zero when any input is zero.
pub fn plomp_levelt(min_loudness: f64, frequency_difference: f64, min_frequency: f64) -> f64 {
    if min_loudness == 0.0 || frequency_difference == 0.0 || min_frequency == 0.0 {
        return 0.0;
    }

    let s = frequency_difference / (0.021 * min_frequency + 19.0);
    min_loudness * ((-0.84 * s).exp() - (-1.38 * s).exp())
}

/// A partial placed at an absolute frequency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundingPartial {
    pub frequency: f64,
    pub loudness: f64,
}

impl SoundingPartial {
    pub fn new(frequency: f64, amplitude: f64) -> Self {
        Self {
            frequency,
            loudness: loudness(amplitude),
        }
    }

    /// Place a relative partial over a fundamental in Hz
    pub fn from_partial(partial: &Partial, fundamental: f64) -> Self {
        Self::new(partial.frequency(fundamental), partial.amplitude)
    }
}

/// Place a whole partial set over a fundamental in Hz
pub fn sounding(partials: &[Partial], fundamental: f64) -> Vec<SoundingPartial> {
    partials
        .iter()
        .map(|p| SoundingPartial::from_partial(p, fundamental))
        .collect()
}

/// Total dissonance of a set of sounding partials
///
/// Sums the roughness of every unordered pair. The input does not need to be
/// sorted.
pub fn intrinsic_dissonance(partials: &[SoundingPartial]) -> f64 {
    let mut sorted = partials.to_vec();
    sorted.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));

    let mut total = 0.0;
    for (i, low) in sorted.iter().enumerate() {
        for high in &sorted[i + 1..] {
            total += plomp_levelt(
                low.loudness.min(high.loudness),
                high.frequency - low.frequency,
                low.frequency,
            );
        }
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn harmonics(count: usize) -> Vec<Partial> {
        (1..=count)
            .map(|i| Partial {
                rate: i as f64,
                amplitude: 1.0 / i as f64,
                phase: None,
            })
            .collect()
    }

    #[test]
    fn test_loudness() {
        assert_relative_eq!(loudness(1.0), 78.84951607609639, max_relative = 1e-12);
        assert_relative_eq!(loudness(0.5), 64.0, max_relative = 1e-12);
        assert_eq!(loudness(0.0), 0.0);
    }

    #[test]
    fn test_plomp_levelt_reference_value() {
        assert_relative_eq!(
            plomp_levelt(64.0, 440.0, 440.0),
            0.0001324695873304775,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_plomp_levelt_zero_inputs() {
        assert_eq!(plomp_levelt(0.0, 440.0, 440.0), 0.0);
        assert_eq!(plomp_levelt(64.0, 0.0, 440.0), 0.0);
        assert_eq!(plomp_levelt(64.0, 440.0, 0.0), 0.0);
    }

    #[test]
    fn test_silent_or_lonely_partials_are_consonant() {
        assert_eq!(intrinsic_dissonance(&[]), 0.0);
        assert_eq!(intrinsic_dissonance(&sounding(&harmonics(1), 440.0)), 0.0);

        let silent = vec![SoundingPartial::new(440.0, 0.0), SoundingPartial::new(460.0, 0.0)];
        assert_eq!(intrinsic_dissonance(&silent), 0.0);
    }

    #[test]
    fn test_octave_pair() {
        let pair = sounding(&harmonics(2), 440.0);
        assert_relative_eq!(
            intrinsic_dissonance(&pair),
            plomp_levelt(64.0, 440.0, 440.0),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_equal_amplitude_octave_pair() {
        let pair = vec![SoundingPartial::new(440.0, 1.0), SoundingPartial::new(880.0, 1.0)];
        assert_relative_eq!(
            intrinsic_dissonance(&pair),
            plomp_levelt(loudness(1.0), 440.0, 440.0),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_four_harmonics() {
        let partials = sounding(&harmonics(4), 440.0);
        assert_relative_eq!(
            intrinsic_dissonance(&partials),
            0.02201318145631032,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_order_does_not_matter() {
        let mut partials = sounding(&harmonics(4), 440.0);
        let forward = intrinsic_dissonance(&partials);
        partials.reverse();
        assert_relative_eq!(intrinsic_dissonance(&partials), forward);
    }

    #[test]
    fn test_close_partials_are_rougher_than_distant() {
        let close = vec![SoundingPartial::new(440.0, 1.0), SoundingPartial::new(460.0, 1.0)];
        let distant = vec![SoundingPartial::new(440.0, 1.0), SoundingPartial::new(1320.0, 1.0)];
        assert!(intrinsic_dissonance(&close) > intrinsic_dissonance(&distant));
    }
}
