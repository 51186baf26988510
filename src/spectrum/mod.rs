//! Spectrum Module
//!
//! Partial series generation and composition:
//! - Value types (partials, layers, spectra)
//! - Series generator (harmonic, equal-division, stretched)
//! - Pure composer operations (stretch, shift, combine, tweak, phases)
//! - Layer recompute from plain settings

pub mod compose;
pub mod generator;
pub mod layer;
pub mod partial;

pub use compose::{
    attach_amplitudes, attach_random_phases, combine, combine_absolute, scale_amplitudes, shift,
    stretch, tweak, Combined, Tweak,
};
pub use generator::{amplitude_for_rate, generate, SeriesKind, SeriesOptions, MAX_ITERATIONS};
pub use layer::{build_layer, recalculate, tweak_spectrum, LayerSettings, SpectrumSettings};
pub use partial::{
    cents_to_ratio, ratio_to_cents, round_to, Partial, SpectralLayer, Spectrum, PRECISION,
};
