//! Analysis Module
//!
//! Perceptual and structural analysis of partial sets:
//! - Plomp-Levelt roughness model
//! - Dissonance curve sweeps (single and multi-octave)
//! - Tuning analyzer (interval fractions, pseudo-octave)
//! - Background worker thread

pub mod curve;
pub mod dissonance;
pub mod tuning;
pub mod worker;

pub use curve::{
    detrend, dissonance_curve, dissonance_curve_for_spectrum, multi_octave_curve, normalize,
    CurveOptions, DissonanceCurve, DissonancePoint, Limits, MinMax, MultiOctaveOptions,
    SweepPosition,
};
pub use dissonance::{intrinsic_dissonance, loudness, plomp_levelt, sounding, SoundingPartial};
pub use tuning::{
    analyze, analyze_with_precision, find_pseudo_octave, reduce_fraction, round_partial_rates,
    Tuning, TuningEntry,
};
pub use worker::{AnalysisOutput, AnalysisRequest, AnalysisResponse, AnalysisTask, AnalysisWorker};
