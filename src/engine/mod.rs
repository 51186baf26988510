//! Voice Engine Module
//!
//! Polyphonic additive synthesis over a host audio backend:
//! - Backend trait and an in-process simulated backend
//! - Voice / oscillator bank / oscillator tree with envelope lifecycle
//! - Positional reconciliation on live spectrum updates
//! - Offline rendering into sample buffers

pub mod backend;
pub mod bank;
pub mod buffer;
pub mod envelope;
pub mod lifecycle;
pub mod oscillator;
pub mod render;
pub mod simulated;
pub mod synth;
pub mod voice;

pub use backend::{AudioBackend, Automation, NodeId, Param};
pub use bank::OscillatorBank;
pub use buffer::SampleBuffer;
pub use envelope::Envelope;
pub use lifecycle::PlayState;
pub use oscillator::Oscillator;
pub use render::{render_partials, RenderOptions};
pub use simulated::SimulatedBackend;
pub use synth::{AdditiveSynth, PlayRequest, DEFAULT_MASTER_GAIN, SILENCE_THRESHOLD};
pub use voice::Voice;
