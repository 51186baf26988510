//! CLI Command Implementations

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use super::SeriesArg;
use crate::analysis::{
    analyze_with_precision, dissonance_curve_for_spectrum, multi_octave_curve, MultiOctaveOptions,
};
use crate::analysis::curve::DEFAULT_POINTS;
use crate::settings::SynthSettings;
use crate::spectrum::{generate, SeriesKind, SeriesOptions, Spectrum};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Load settings from a file, or fall back to the defaults
pub fn load_settings(path: Option<&Path>) -> Result<SynthSettings> {
    let Some(path) = path else {
        return Ok(SynthSettings::default());
    };

    tracing::info!("Loading settings: {}", path.display());
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let settings = SynthSettings::from_json(&json)
        .with_context(|| format!("invalid settings in {}", path.display()))?;
    Ok(settings)
}

fn build_spectrum(settings: &SynthSettings, seed: Option<u64>) -> Result<Spectrum> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    settings
        .build_spectrum(&mut rng)
        .context("failed to build spectrum")
}

/// Generate a single partial series.
pub fn series(
    kind: SeriesArg,
    count: usize,
    slope: f64,
    pseudo_octave_cents: f64,
    divisions: u32,
    stretch: f64,
) -> Result<()> {
    let options = SeriesOptions {
        kind: SeriesKind::from(kind),
        count: count as f64,
        amplitude_slope: slope,
        pseudo_octave_cents,
        divisions,
        stretch_factor: stretch,
        ..SeriesOptions::default()
    };

    let partials = generate(&options)
        .with_context(|| format!("failed to generate {} series", options.kind))?;
    print_json(&partials)
}

/// Build and print the spectrum of a settings file.
pub fn spectrum(settings: Option<&Path>, seed: Option<u64>) -> Result<()> {
    let settings = load_settings(settings)?;
    let spectrum = build_spectrum(&settings, seed)?;
    print_json(&spectrum)
}

/// Print the tuning analysis of a spectrum.
pub fn tuning(settings: Option<&Path>, precision: u32) -> Result<()> {
    let settings = load_settings(settings)?;
    let spectrum = build_spectrum(&settings, Some(0))?;

    let tuning = analyze_with_precision(&spectrum.all_partials(), precision);
    tracing::info!(
        "Found {} intervals, pseudo-octave {}",
        tuning.entries.len(),
        tuning.pseudo_octave_ratio()
    );
    print_json(&tuning)
}

/// Print a dissonance curve of a spectrum.
pub fn curve(
    settings: Option<&Path>,
    points: Option<usize>,
    fundamental: f64,
    multi_octave: bool,
    tsv: bool,
    minima: bool,
) -> Result<()> {
    let settings = load_settings(settings)?;
    let spectrum = build_spectrum(&settings, Some(0))?;
    let partials = spectrum.all_partials();

    let mut curve = if multi_octave {
        let options = MultiOctaveOptions {
            fundamental,
            points,
            ..MultiOctaveOptions::default()
        };
        multi_octave_curve(&partials, &options)
    } else {
        dissonance_curve_for_spectrum(&partials, points.unwrap_or(DEFAULT_POINTS), fundamental)
    }
    .context("failed to compute dissonance curve")?;

    if minima {
        curve.points = curve.minima();
    }

    if tsv {
        print!("{}", curve.to_tsv());
        Ok(())
    } else {
        print_json(&curve)
    }
}

/// Print the effective settings.
pub fn print_settings(settings: Option<&Path>) -> Result<()> {
    let settings = load_settings(settings)?;
    println!("{}", settings.to_json()?);
    Ok(())
}
