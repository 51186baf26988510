//! CLI Module
//!
//! Command-line front-end over the library. Every command prints JSON (or
//! TSV for curves) to stdout.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::spectrum::SeriesKind;

/// Xenspectra - microtonal spectra and dissonance analysis
#[derive(Parser, Debug)]
#[command(name = "xenspectra")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Series kind as accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeriesArg {
    Harmonic,
    EqualDivision,
    Stretched,
}

impl From<SeriesArg> for SeriesKind {
    fn from(arg: SeriesArg) -> Self {
        match arg {
            SeriesArg::Harmonic => SeriesKind::Harmonic,
            SeriesArg::EqualDivision => SeriesKind::EqualDivision,
            SeriesArg::Stretched => SeriesKind::Stretched,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a single partial series
    #[command(name = "series")]
    Series {
        #[arg(short = 't', long = "type", value_enum, default_value = "harmonic")]
        kind: SeriesArg,

        /// Number of partials
        #[arg(short, long, default_value_t = 6)]
        count: usize,

        /// Amplitude roll-off exponent
        #[arg(short, long, default_value_t = 1.0)]
        slope: f64,

        /// Pseudo-octave size in cents
        #[arg(long, default_value_t = 1200.0)]
        pseudo_octave_cents: f64,

        /// Steps per pseudo-octave for equal-division series
        #[arg(long, default_value_t = 12)]
        divisions: u32,

        /// Stretch factor for stretched series
        #[arg(long, default_value_t = 2.0)]
        stretch: f64,
    },

    /// Build the spectrum described by a settings file
    #[command(name = "spectrum")]
    Spectrum {
        /// Settings JSON file (defaults when omitted)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Seed for partial phases
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Analyze the interval structure of a spectrum
    #[command(name = "tuning")]
    Tuning {
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Decimal digits kept on partial rates
        #[arg(short, long, default_value_t = 3)]
        precision: u32,
    },

    /// Compute a dissonance curve of a spectrum
    #[command(name = "curve")]
    Curve {
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Points per pseudo-octave
        #[arg(short, long)]
        points: Option<usize>,

        /// Sweep fundamental in Hz
        #[arg(short, long, default_value_t = 261.63)]
        fundamental: f64,

        /// Sweep every pseudo-octave the spectrum spans
        #[arg(long)]
        multi_octave: bool,

        /// Print tab-separated values instead of JSON
        #[arg(long)]
        tsv: bool,

        /// Only print the local minima
        #[arg(long)]
        minima: bool,
    },

    /// Print the effective settings as JSON
    #[command(name = "print-settings")]
    PrintSettings {
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}
