//! Xenspectra - Microtonal Spectra and Sensory Dissonance
//!
//! Xenspectra generates inharmonic and microtonal spectra, measures how
//! rough they sound against themselves, and plays them through a polyphonic
//! additive voice engine.
//!
//! # Architecture
//!
//! Leaves first:
//! - `spectrum`: partial series generation and pure composition
//! - `analysis`: tuning analyzer, Plomp-Levelt roughness and dissonance curves
//! - `engine`: voice / oscillator-bank / oscillator tree over a host backend
//! - `settings`: serde configuration for a whole instrument

pub mod analysis;
pub mod cli;
pub mod engine;
pub mod error;
pub mod settings;
pub mod spectrum;

pub use error::{Result, XenError};
